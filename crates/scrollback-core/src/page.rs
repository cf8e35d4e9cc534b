//! A batch of feed items and the cursors around it.

use std::collections::HashSet;

use scrollback_types::{Cursor, Item, ItemId};

use crate::error::RemoteDataError;
use crate::remote::RawBatch;

/// One batch of items, newest first, plus the cursors for the batches on
/// either side.
///
/// A page is keyed by its *last* (oldest) item. Neither cursor is guaranteed
/// to lead back to this page from its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<P> {
    pub data: Vec<Item<P>>,
    /// Resume toward newer items.
    pub prev_key: Option<Cursor>,
    /// Resume toward older items.
    pub next_key: Option<Cursor>,
}

impl<P> Page<P> {
    pub fn new(data: Vec<Item<P>>, prev_key: Option<Cursor>, next_key: Option<Cursor>) -> Self {
        Self {
            data,
            prev_key,
            next_key,
        }
    }

    /// Id of the oldest item; the key this page is cached under.
    pub fn key(&self) -> Option<&ItemId> {
        self.data.last().map(|item| &item.id)
    }

    pub fn newest_id(&self) -> Option<&ItemId> {
        self.data.first().map(|item| &item.id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.data.iter().any(|item| &item.id == id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stitch this page between optional neighbours into one page.
    ///
    /// Data is `prev ++ self ++ next` with repeated ids dropped (the first
    /// occurrence wins, relative order is kept). Neighbour cursors are not
    /// aligned, so consecutive fetches routinely overlap by a few items. The
    /// outer cursors come from the outermost page present.
    pub fn merge(self, prev: Option<Page<P>>, next: Option<Page<P>>) -> Page<P> {
        let prev_key = match &prev {
            Some(p) => p.prev_key.clone(),
            None => self.prev_key.clone(),
        };
        let next_key = match &next {
            Some(n) => n.next_key.clone(),
            None => self.next_key.clone(),
        };

        let capacity = self.data.len()
            + prev.as_ref().map_or(0, Page::len)
            + next.as_ref().map_or(0, Page::len);
        let mut seen = HashSet::with_capacity(capacity);
        let mut data = Vec::with_capacity(capacity);

        let chained = prev
            .into_iter()
            .flat_map(|p| p.data)
            .chain(self.data)
            .chain(next.into_iter().flat_map(|n| n.data));
        for item in chained {
            if seen.insert(item.id.clone()) {
                data.push(item);
            }
        }

        Page {
            data,
            prev_key,
            next_key,
        }
    }
}

impl<P> TryFrom<RawBatch<P>> for Page<P> {
    type Error = RemoteDataError;

    fn try_from(batch: RawBatch<P>) -> Result<Self, Self::Error> {
        if !batch.is_success() {
            return Err(RemoteDataError::Status {
                code: batch.status,
                message: batch.message.unwrap_or_default(),
            });
        }
        Ok(Page::new(batch.items, batch.prev_key, batch.next_key))
    }
}
