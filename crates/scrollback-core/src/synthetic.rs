//! In-memory doubles for the remote feed and the window provider.
//!
//! [`SyntheticTimeline`] is a deterministic feed of numeric ids (`10`, `20`,
//! ... newest highest) that pages the way a Mastodon-style timeline does. Ids
//! grow across digit boundaries, so anything that compares them as plain
//! strings breaks quickly.
//!
//! With [`SyntheticTimeline::with_overlap`] the advertised cursors point a few
//! items *inside* the batch instead of at its edges, so neighbouring fetches
//! overlap the way real feeds do.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use scrollback_types::{Cursor, Item, ItemId};

use crate::error::RemoteDataError;
use crate::remote::{FetchDirection, FetchRequest, RawBatch, RemoteTimelineClient};
use crate::window::WindowProvider;

/// Which fetches a [`SyntheticTimeline`] should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Every fetch fails at the transport level.
    Every,
    /// Fetches in this direction fail at the transport level.
    Direction(FetchDirection),
    /// Fetches resuming from this cursor fail at the transport level.
    Cursor(Cursor),
    /// Every fetch gets a response with this status.
    Status(u16),
}

#[derive(Debug)]
struct FeedState {
    /// Newest first.
    items: Vec<Item<String>>,
    newest: u64,
    calls: Vec<FetchRequest>,
    failure: Option<FailOn>,
}

/// Deterministic in-memory feed.
#[derive(Debug)]
pub struct SyntheticTimeline {
    state: Mutex<FeedState>,
    overlap: usize,
    latency: Option<Duration>,
}

impl SyntheticTimeline {
    /// A feed of `len` items with ids `len * 10` down to `10`.
    pub fn new(len: usize) -> Self {
        let newest = len as u64 * 10;
        let items = (0..len as u64)
            .map(|i| synthetic_item(newest - i * 10))
            .collect();
        Self {
            state: Mutex::new(FeedState {
                items,
                newest,
                calls: Vec::new(),
                failure: None,
            }),
            overlap: 0,
            latency: None,
        }
    }

    /// Advertise cursors `overlap` items inside each batch.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    /// Sleep this long before answering each fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add `count` items newer than everything in the feed.
    pub fn publish(&self, count: usize) {
        let mut state = self.state.lock();
        let fresh: Vec<_> = (1..=count as u64)
            .rev()
            .map(|i| synthetic_item(state.newest + i * 10))
            .collect();
        state.newest += count as u64 * 10;
        state.items.splice(0..0, fresh);
    }

    pub fn set_failure(&self, failure: Option<FailOn>) {
        self.state.lock().failure = failure;
    }

    /// Every request seen so far, in arrival order.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    fn respond(&self, request: FetchRequest) -> Result<RawBatch<String>, RemoteDataError> {
        let mut state = self.state.lock();
        state.calls.push(request.clone());

        match &state.failure {
            Some(FailOn::Every) => {
                return Err(RemoteDataError::Transport("injected failure".into()));
            }
            Some(FailOn::Direction(d)) if *d == request.direction => {
                return Err(RemoteDataError::Transport(format!("injected {d} failure")));
            }
            Some(FailOn::Cursor(c)) if request.cursor.as_ref() == Some(c) => {
                return Err(RemoteDataError::Transport(format!("injected failure at {c}")));
            }
            Some(FailOn::Status(code)) => {
                return Ok(RawBatch::failed(*code, "injected status"));
            }
            _ => {}
        }

        let items = &state.items;
        let (start, end) = match (&request.cursor, request.direction) {
            (Some(cursor), FetchDirection::TowardOlder) => {
                let cursor = ItemId::from(cursor.as_str());
                let start = items.partition_point(|item| !item.id.is_less_than(&cursor));
                (start, (start + request.limit).min(items.len()))
            }
            (Some(cursor), FetchDirection::TowardNewer) => {
                let cursor = ItemId::from(cursor.as_str());
                let end = items.partition_point(|item| cursor.is_less_than(&item.id));
                (end.saturating_sub(request.limit), end)
            }
            _ => (0, request.limit.min(items.len())),
        };

        if start == end {
            return Ok(RawBatch::ok(Vec::new(), None, None));
        }

        let batch = &items[start..end];
        let inset = self.overlap.min(batch.len() - 1);
        let prev_key = Cursor::new(batch[inset].id.as_str());
        let next_key = (end < items.len())
            .then(|| Cursor::new(batch[batch.len() - 1 - inset].id.as_str()));

        Ok(RawBatch::ok(batch.to_vec(), Some(prev_key), next_key))
    }
}

#[async_trait]
impl RemoteTimelineClient for SyntheticTimeline {
    type Payload = String;

    async fn fetch(&self, request: FetchRequest) -> Result<RawBatch<String>, RemoteDataError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.respond(request)
    }
}

fn synthetic_item(id: u64) -> Item<String> {
    Item::new(id.to_string(), format!("status #{id}"))
}

/// Window provider that only counts invalidations.
#[derive(Debug, Default)]
pub struct RecordingWindow {
    invalidations: AtomicUsize,
}

impl RecordingWindow {
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Acquire)
    }
}

impl WindowProvider for RecordingWindow {
    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::AcqRel);
    }
}
