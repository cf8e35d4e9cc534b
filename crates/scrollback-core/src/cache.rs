//! Ordered cache of fetched pages.
//!
//! Pages are keyed by the id of their oldest item under the length-first
//! [`ItemId`] order, so a `BTreeMap` gives the directional lookups for free:
//!
//! ```text
//!   older ◀────────────────────────────────────────────────▶ newer
//!   key:   110           240           370           500
//!          first_entry   lower_entry   k             higher_entry
//!                                                    last_entry
//! ```
//!
//! `floor_entry(id)` for an id between 370 and the newest item of that page
//! lands on `k`.
//!
//! [`SharedPageCache`] is the only way to reach a cache from outside the
//! loader: one `RwLock` around the map, snapshot reads, and a single write
//! guard for the whole clear + upsert sequence of a load.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;
use scrollback_types::ItemId;
use tracing::trace;

use crate::page::Page;

/// A cached page together with the key it is stored under.
pub type PageEntry<'a, P> = (&'a ItemId, &'a Arc<Page<P>>);

/// Sorted map from a page's oldest item id to the page.
///
/// Every stored page is non-empty and sits under its own [`Page::key`].
#[derive(Debug)]
pub struct PageCache<P> {
    pages: BTreeMap<ItemId, Arc<Page<P>>>,
}

impl<P> Clone for PageCache<P> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
        }
    }
}

impl<P> Default for PageCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PageCache<P> {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// Entry with the greatest key `<= key`.
    pub fn floor_entry(&self, key: &ItemId) -> Option<PageEntry<'_, P>> {
        self.pages.range::<ItemId, _>(..=key).next_back()
    }

    /// Entry with the greatest key `< key`.
    pub fn lower_entry(&self, key: &ItemId) -> Option<PageEntry<'_, P>> {
        self.pages
            .range::<ItemId, _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back()
    }

    /// Entry with the smallest key `> key`.
    pub fn higher_entry(&self, key: &ItemId) -> Option<PageEntry<'_, P>> {
        self.pages
            .range::<ItemId, _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
    }

    /// The page holding the oldest cached items.
    pub fn first_entry(&self) -> Option<PageEntry<'_, P>> {
        self.pages.iter().next()
    }

    /// The page holding the newest cached items.
    pub fn last_entry(&self) -> Option<PageEntry<'_, P>> {
        self.pages.iter().next_back()
    }

    /// The cached page containing `id`, if any.
    pub fn covering_page(&self, id: &ItemId) -> Option<&Arc<Page<P>>> {
        self.floor_entry(id)
            .map(|(_, page)| page)
            .filter(|page| page.contains(id))
    }

    /// Store `page` under its own key, replacing any page with the same key.
    ///
    /// Returns `false` (and stores nothing) for an empty page, which has no key.
    pub fn upsert(&mut self, page: Page<P>) -> bool {
        let Some(key) = page.key().cloned() else {
            return false;
        };
        self.pages.insert(key, Arc::new(page));
        true
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = PageEntry<'_, P>> {
        self.pages.iter()
    }

    /// Dump every page at trace level, oldest first.
    pub fn log_contents(&self) {
        for (index, (key, page)) in self.pages.iter().enumerate() {
            trace!(
                "  {index}: k: {key}, prev_key: {:?}, next_key: {:?}, size: {}",
                page.prev_key,
                page.next_key,
                page.len()
            );
        }
    }
}

/// Cloneable handle to one session's page cache.
///
/// The loader is the only writer. Everyone else reads through
/// [`snapshot`](Self::snapshot) or [`read`](Self::read); neither can observe a
/// load halfway through installing its page.
pub struct SharedPageCache<P> {
    inner: Arc<RwLock<PageCache<P>>>,
}

impl<P> Clone for SharedPageCache<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Default for SharedPageCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SharedPageCache<P> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(PageCache::new())),
        }
    }

    /// A consistent copy of the cache. Pages are shared, not copied.
    pub fn snapshot(&self) -> PageCache<P> {
        self.inner.read().clone()
    }

    /// Run `f` against the cache under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&PageCache<P>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` against the cache under the write lock, as one atomic unit.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut PageCache<P>) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn covering_page(&self, id: &ItemId) -> Option<Arc<Page<P>>> {
        self.inner.read().covering_page(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollback_types::Item;

    fn page(ids: &[&str]) -> Page<()> {
        Page::new(ids.iter().map(|id| Item::new(*id, ())).collect(), None, None)
    }

    /// Three pages: [500..370], [300..240], [150..110]
    fn three_pages() -> PageCache<()> {
        let mut cache = PageCache::new();
        assert!(cache.upsert(page(&["500", "420", "370"])));
        assert!(cache.upsert(page(&["300", "270", "240"])));
        assert!(cache.upsert(page(&["150", "110"])));
        cache
    }

    fn key(entry: Option<PageEntry<'_, ()>>) -> Option<&str> {
        entry.map(|(k, _)| k.as_str())
    }

    #[test]
    fn test_upsert_keys_by_oldest_item() {
        let cache = three_pages();
        let keys: Vec<&str> = cache.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["110", "240", "370"]);
        for (k, p) in cache.iter() {
            assert_eq!(Some(k), p.key());
        }
    }

    #[test]
    fn test_upsert_empty_page_is_ignored() {
        let mut cache = PageCache::<()>::new();
        assert!(!cache.upsert(page(&[])));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_upsert_replaces_same_key() {
        let mut cache = three_pages();
        cache.upsert(page(&["999", "370"]));
        assert_eq!(cache.len(), 3);
        let (_, newest) = cache.last_entry().unwrap();
        assert_eq!(newest.len(), 2);
    }

    #[test]
    fn test_floor_entry() {
        let cache = three_pages();
        assert_eq!(key(cache.floor_entry(&ItemId::from("420"))), Some("370"));
        assert_eq!(key(cache.floor_entry(&ItemId::from("370"))), Some("370"));
        assert_eq!(key(cache.floor_entry(&ItemId::from("270"))), Some("240"));
        assert_eq!(key(cache.floor_entry(&ItemId::from("100"))), None);
        // Length-first: "1000" is newer than every cached id.
        assert_eq!(key(cache.floor_entry(&ItemId::from("1000"))), Some("370"));
    }

    #[test]
    fn test_lower_and_higher_entry() {
        let cache = three_pages();
        let mid = ItemId::from("240");
        assert_eq!(key(cache.lower_entry(&mid)), Some("110"));
        assert_eq!(key(cache.higher_entry(&mid)), Some("370"));
        assert_eq!(key(cache.lower_entry(&ItemId::from("110"))), None);
        assert_eq!(key(cache.higher_entry(&ItemId::from("370"))), None);
    }

    #[test]
    fn test_first_and_last_entry() {
        let cache = three_pages();
        assert_eq!(key(cache.first_entry()), Some("110"));
        assert_eq!(key(cache.last_entry()), Some("370"));
        let empty = PageCache::<()>::new();
        assert!(empty.first_entry().is_none());
        assert!(empty.last_entry().is_none());
    }

    #[test]
    fn test_covering_page_requires_membership() {
        let cache = three_pages();
        assert!(cache.covering_page(&ItemId::from("270")).is_some());
        // Floor page exists (240) but 260 was never fetched.
        assert!(cache.covering_page(&ItemId::from("260")).is_none());
    }

    #[test]
    fn test_shared_snapshot_is_detached() {
        let shared = SharedPageCache::new();
        shared.write(|c| c.upsert(page(&["2", "1"])));
        let snapshot = shared.snapshot();

        shared.write(|c| {
            c.clear();
            c.upsert(page(&["9", "8"]))
        });

        assert_eq!(key(snapshot.first_entry()), Some("1"));
        let first = shared.read(|c| c.first_entry().map(|(k, _)| k.clone()));
        assert_eq!(first, Some(ItemId::from("8")));
    }
}
