//! Pagination cursors from an HTTP `Link` header (RFC 8288).
//!
//! Mastodon-style feeds paginate with a header like:
//!
//! ```text
//! Link: <https://host/api/v1/timelines/public?max_id=941865>; rel="next",
//!       <https://host/api/v1/timelines/public?min_id=995916>; rel="prev"
//! ```
//!
//! The `next` link carries a `max_id` (resume toward older items) and the
//! `prev` link a `min_id` (resume toward newer items). Only those two query
//! values are extracted, percent-decoded; the rest of the URI is the
//! transport's business.

use thiserror::Error;
use url::form_urlencoded;

use crate::Cursor;

/// Query parameter carried by the `next` link.
const NEXT_PARAM: &str = "max_id";

/// Query parameter carried by the `prev` link.
const PREV_PARAM: &str = "min_id";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkParseError {
    /// A link value did not start with `<`.
    #[error("expected '<' at byte {0}")]
    ExpectedUri(usize),

    /// A `<` was never closed.
    #[error("unterminated URI starting at byte {0}")]
    UnterminatedUri(usize),
}

/// One `<uri>; param=value; ...` entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLink {
    pub uri: String,
    /// Relation types from `rel=`, lowercased; a single `rel` may list several.
    pub rels: Vec<String>,
}

impl HeaderLink {
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }

    /// Decoded value of a query parameter in this link's URI, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let (_, query) = self.uri.split_once('?')?;
        let query = query.split('#').next().unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Parse a full `Link` header value into its entries.
pub fn parse_link_header(header: &str) -> Result<Vec<HeaderLink>, LinkParseError> {
    let mut links = Vec::new();
    let bytes = header.as_bytes();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b',') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if bytes[pos] != b'<' {
            return Err(LinkParseError::ExpectedUri(pos));
        }
        let uri_start = pos + 1;
        let uri_end = header[uri_start..]
            .find('>')
            .map(|off| uri_start + off)
            .ok_or(LinkParseError::UnterminatedUri(pos))?;
        let uri = header[uri_start..uri_end].to_string();
        pos = uri_end + 1;

        // Params run until the next top-level comma; quoted strings may contain commas.
        let params_start = pos;
        let mut in_quotes = false;
        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => in_quotes = !in_quotes,
                b',' if !in_quotes => break,
                _ => {}
            }
            pos += 1;
        }

        let rels = header[params_start..pos]
            .split(';')
            .filter_map(|param| {
                let (name, value) = param.split_once('=')?;
                name.trim()
                    .eq_ignore_ascii_case("rel")
                    .then(|| value.trim().trim_matches('"').to_string())
            })
            .flat_map(|value| {
                value
                    .split_ascii_whitespace()
                    .map(str::to_ascii_lowercase)
                    .collect::<Vec<_>>()
            })
            .collect();

        links.push(HeaderLink { uri, rels });
    }

    Ok(links)
}

/// The two cursors a feed response advertises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    /// Resume toward older items.
    pub next: Option<Cursor>,
    /// Resume toward newer items.
    pub prev: Option<Cursor>,
}

impl Links {
    /// Extract cursors from an optional `Link` header.
    ///
    /// A missing header, or a link without the expected query parameter, yields
    /// `None` for that direction.
    pub fn from_header(header: Option<&str>) -> Result<Self, LinkParseError> {
        let Some(header) = header else {
            return Ok(Self::default());
        };
        let links = parse_link_header(header)?;
        let cursor = |rel: &str, param: &str| {
            links
                .iter()
                .find(|l| l.has_rel(rel))
                .and_then(|l| l.query_param(param))
                .filter(|v| !v.is_empty())
                .map(Cursor::new)
        };
        Ok(Self {
            next: cursor("next", NEXT_PARAM),
            prev: cursor("prev", PREV_PARAM),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTODON: &str = "<https://mastodon.social/api/v1/timelines/public?max_id=941865>; rel=\"next\", \
         <https://mastodon.social/api/v1/timelines/public?min_id=995916>; rel=\"prev\"";

    #[test]
    fn test_mastodon_header() {
        let links = Links::from_header(Some(MASTODON)).unwrap();
        assert_eq!(links.next, Some(Cursor::from("941865")));
        assert_eq!(links.prev, Some(Cursor::from("995916")));
    }

    #[test]
    fn test_missing_header_has_no_cursors() {
        assert_eq!(Links::from_header(None).unwrap(), Links::default());
    }

    #[test]
    fn test_only_next_link() {
        let header = "<https://h/api?limit=30&max_id=12>; rel=\"next\"";
        let links = Links::from_header(Some(header)).unwrap();
        assert_eq!(links.next, Some(Cursor::from("12")));
        assert_eq!(links.prev, None);
    }

    #[test]
    fn test_wrong_param_for_rel_is_ignored() {
        // A prev link must carry min_id; max_id on it is not a prev cursor.
        let header = "<https://h/api?max_id=5>; rel=\"prev\"";
        let links = Links::from_header(Some(header)).unwrap();
        assert_eq!(links.prev, None);
    }

    #[test]
    fn test_multiple_rels_and_extra_params() {
        let header = "<https://h/a?max_id=7>; title=\"a, b\"; rel=\"next last\"";
        let parsed = parse_link_header(header).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].has_rel("next"));
        assert!(parsed[0].has_rel("LAST"));
        assert_eq!(parsed[0].query_param("max_id").as_deref(), Some("7"));
    }

    #[test]
    fn test_encoded_cursor_is_decoded() {
        let header = "<https://h/api?max_id=a%2Fb%3D&limit=30>; rel=\"next\", \
                      <https://h/api?min_id=x%26y>; rel=\"prev\"";
        let links = Links::from_header(Some(header)).unwrap();
        assert_eq!(links.next, Some(Cursor::from("a/b=")));
        assert_eq!(links.prev, Some(Cursor::from("x&y")));
    }

    #[test]
    fn test_unterminated_uri() {
        let err = parse_link_header("<https://h/a?max_id=7; rel=next").unwrap_err();
        assert_eq!(err, LinkParseError::UnterminatedUri(0));
    }

    #[test]
    fn test_garbage_before_uri() {
        let err = parse_link_header("rel=next").unwrap_err();
        assert_eq!(err, LinkParseError::ExpectedUri(0));
    }
}
