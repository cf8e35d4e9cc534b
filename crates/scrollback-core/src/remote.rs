//! The remote feed seam.
//!
//! The engine never talks HTTP. It hands a [`FetchRequest`] to a
//! [`RemoteTimelineClient`] and gets a [`RawBatch`] back: items newest first,
//! the response status, and whatever cursors the feed advertised for the
//! neighbouring batches.

use async_trait::async_trait;
use scrollback_types::{Cursor, Item, Links};

use crate::error::RemoteDataError;

/// Which way to page from the request cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FetchDirection {
    /// Items immediately newer than the cursor.
    TowardNewer,
    /// Items immediately older than the cursor.
    TowardOlder,
    /// No cursor: the most recent batch.
    Latest,
}

/// One request to the remote feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub cursor: Option<Cursor>,
    pub direction: FetchDirection,
    pub limit: usize,
}

impl FetchRequest {
    /// Query pairs for a Mastodon-style timeline endpoint.
    ///
    /// Older-ward fetches send the cursor as `max_id`, newer-ward fetches as
    /// `min_id` (the items immediately above it rather than the newest ones).
    /// Values are decoded cursor text; the transport encodes them.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(2);
        if let Some(cursor) = &self.cursor {
            match self.direction {
                FetchDirection::TowardOlder => params.push(("max_id", cursor.to_string())),
                FetchDirection::TowardNewer => params.push(("min_id", cursor.to_string())),
                FetchDirection::Latest => {}
            }
        }
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// A response as the transport saw it, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatch<P> {
    /// HTTP-style status code; 2xx is success.
    pub status: u16,
    /// Error body or reason phrase for non-success statuses.
    pub message: Option<String>,
    pub items: Vec<Item<P>>,
    /// Resume toward older items.
    pub next_key: Option<Cursor>,
    /// Resume toward newer items.
    pub prev_key: Option<Cursor>,
}

impl<P> RawBatch<P> {
    pub fn ok(items: Vec<Item<P>>, prev_key: Option<Cursor>, next_key: Option<Cursor>) -> Self {
        Self {
            status: 200,
            message: None,
            items,
            next_key,
            prev_key,
        }
    }

    /// Successful response whose cursors came from a `Link` header.
    pub fn with_links(items: Vec<Item<P>>, links: Links) -> Self {
        Self::ok(items, links.prev, links.next)
    }

    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            items: Vec::new(),
            next_key: None,
            prev_key: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches batches from the remote feed.
///
/// Implementations own transport, (de)serialization, and timeouts. An `Err`
/// means no response at all; a response with a failure status comes back as
/// `Ok` and is rejected when it is turned into a page.
#[async_trait]
pub trait RemoteTimelineClient: Send + Sync {
    type Payload: Clone + Send + Sync + 'static;

    async fn fetch(
        &self,
        request: FetchRequest,
    ) -> Result<RawBatch<Self::Payload>, RemoteDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_per_direction() {
        let older = FetchRequest {
            cursor: Some(Cursor::from("100")),
            direction: FetchDirection::TowardOlder,
            limit: 30,
        };
        assert_eq!(
            older.query_params(),
            vec![("max_id", "100".to_string()), ("limit", "30".to_string())]
        );

        let newer = FetchRequest {
            direction: FetchDirection::TowardNewer,
            ..older.clone()
        };
        assert_eq!(newer.query_params()[0], ("min_id", "100".to_string()));

        let latest = FetchRequest {
            cursor: None,
            direction: FetchDirection::Latest,
            limit: 30,
        };
        assert_eq!(latest.query_params(), vec![("limit", "30".to_string())]);
    }

    #[test]
    fn test_batch_status() {
        assert!(RawBatch::<()>::ok(vec![], None, None).is_success());
        assert!(!RawBatch::<()>::failed(503, "unavailable").is_success());
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(FetchDirection::TowardNewer.to_string(), "toward_newer");
        assert_eq!(FetchDirection::Latest.to_string(), "latest");
    }
}
