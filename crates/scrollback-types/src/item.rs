//! The feed item envelope.

use serde::{Deserialize, Serialize};

use crate::ItemId;

/// One feed item: identity plus whatever the feed carries for it.
///
/// The payload is opaque to the cache and loader; only `id` participates in
/// ordering and deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item<P> {
    pub id: ItemId,
    pub payload: P,
}

impl<P> Item<P> {
    pub fn new(id: impl Into<ItemId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}
