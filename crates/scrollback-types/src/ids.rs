//! Item identifiers, their total order, and pagination cursors.
//!
//! Feed identifiers are non-negative integers rendered as decimal strings
//! without leading zeros, and they may be wider than any native integer type.
//! Comparing them as plain strings is wrong across lengths ("10" < "2"), so
//! [`ItemId`] orders by length first and only then lexicographically. That is
//! numeric order without ever parsing the digits.
//!
//! [`Cursor`] is a separate type: a cursor is whatever the
//! remote feed says to send back, and it is not guaranteed to equal (or even
//! share a namespace with) any item identifier.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Compare two identifiers: shorter is less, equal lengths compare bytewise.
pub fn item_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// `true` when `a` sorts strictly before `b` under [`item_order`].
///
/// ```
/// use scrollback_types::is_less_than;
///
/// assert!(is_less_than("9", "10"));
/// assert!(is_less_than("cb", "abc"));
/// assert!(!is_less_than("ab", "ab"));
/// ```
pub fn is_less_than(a: &str, b: &str) -> bool {
    item_order(a, b) == Ordering::Less
}

/// Identity of a feed item.
///
/// `Ord` is the length-first order from [`item_order`], so an `ItemId` can be
/// used directly as a `BTreeMap` key. There is no `Borrow<str>`: `str`'s own
/// order disagrees with this one and would break map lookups.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this identifier sorts strictly before `other`.
    pub fn is_less_than(&self, other: &ItemId) -> bool {
        self < other
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        item_order(&self.0, &other.0)
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

/// Opaque pagination token returned by the remote feed.
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    // ── Ordering ────────────────────────────────────────────────────────

    #[test]
    fn test_shorter_id_is_less() {
        assert!(is_less_than("9", "10"));
        assert!(is_less_than("2", "10"));
        assert!(!is_less_than("10", "9"));
    }

    #[test]
    fn test_equal_length_is_lexicographic() {
        assert!(is_less_than("abc", "bcd"));
        assert!(is_less_than("109934818460629189", "110033940961955385"));
        assert!(!is_less_than("bcd", "abc"));
    }

    #[test]
    fn test_length_wins_over_content() {
        assert!(is_less_than("ab", "abc"));
        assert!(is_less_than("cb", "abc"));
        assert!(!is_less_than("abc", "cb"));
    }

    #[test]
    fn test_equal_ids_are_not_less() {
        assert!(!is_less_than("ab", "ab"));
        assert_eq!(item_order("ab", "ab"), Ordering::Equal);
    }

    #[test]
    fn test_wide_ids_order_numerically() {
        // Wider than u128, so parsing is not an option.
        let small = "340282366920938463463374607431768211456";
        let big = "3402823669209384634633746074317682114560";
        assert!(is_less_than(small, big));
    }

    #[test]
    fn test_item_id_ord_matches_item_order() {
        let mut ids: Vec<ItemId> = ["10", "9", "100", "11", "2"]
            .into_iter()
            .map(ItemId::from)
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(ItemId::as_str).collect();
        assert_eq!(sorted, vec!["2", "9", "10", "11", "100"]);
    }

    #[test]
    fn test_item_id_as_btree_key() {
        let mut map = BTreeMap::new();
        map.insert(ItemId::from("10"), "ten");
        map.insert(ItemId::from("9"), "nine");
        assert_eq!(map.keys().next().map(ItemId::as_str), Some("9"));
        assert_eq!(map.get(&ItemId::from("10")), Some(&"ten"));
    }

    // ── Formatting / serde ──────────────────────────────────────────────

    #[test]
    fn test_debug_shows_type_name() {
        assert_eq!(format!("{:?}", ItemId::from("42")), "ItemId(42)");
        assert_eq!(format!("{:?}", Cursor::from("abc")), "Cursor(abc)");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ItemId::from("110033940961955385");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"110033940961955385\"");
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
