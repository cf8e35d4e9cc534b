//! Scroll windows served straight from the page cache.
//!
//! The loader only knows [`WindowProvider::invalidate`]. [`TimelineWindowSource`]
//! is the provider the UI side uses: it hands out windows built from cached
//! pages, tags each with a generation, and bumps the generation (and tells
//! subscribers) whenever the loader changes the cache.
//!
//! Windows link to their neighbours by *page key*, not by cursor: a window's
//! `prev_key` is the key of the next newer cached page and `next_key` the key
//! of the next older one, so a UI can walk everything cached without any
//! remote call and only asks the loader for more at the edges.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use scrollback_types::{Item, ItemId};
use tokio::sync::broadcast;
use tracing::{trace, trace_span};

use crate::cache::SharedPageCache;
use crate::constants::INVALIDATION_CHANNEL_CAPACITY;
use crate::page::Page;

/// Told by the loader that the cache changed.
///
/// Called after every successful cache mutation. Implementations rebuild
/// lazily; this must not block.
pub trait WindowProvider: Send + Sync {
    fn invalidate(&self);
}

/// A run of cached items ready for display.
#[derive(Debug, Clone)]
pub struct Window<P> {
    pub page: Arc<Page<P>>,
    /// Key of the adjacent newer cached page.
    pub prev_key: Option<ItemId>,
    /// Key of the adjacent older cached page.
    pub next_key: Option<ItemId>,
    /// Generation of the cache this window was cut from.
    pub generation: u64,
}

impl<P> Window<P> {
    pub fn items(&self) -> &[Item<P>] {
        &self.page.data
    }
}

/// Builds windows from a [`SharedPageCache`] and tracks invalidations.
pub struct TimelineWindowSource<P> {
    cache: SharedPageCache<P>,
    generation: AtomicU64,
    events: broadcast::Sender<u64>,
}

impl<P> TimelineWindowSource<P> {
    pub fn new(cache: SharedPageCache<P>) -> Self {
        let (events, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            cache,
            generation: AtomicU64::new(0),
            events,
        }
    }

    /// Current generation; bumped by every invalidation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether a window cut at `generation` still reflects the cache.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Receive the new generation after each invalidation.
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.events.subscribe()
    }

    /// Window for `key`, or the newest cached page when `key` is `None`.
    ///
    /// A key between cached pages resolves to the closest older page; one
    /// older than everything cached resolves to the oldest page. `None` only
    /// when the cache is empty.
    pub fn load_window(&self, key: Option<&ItemId>) -> Option<Window<P>> {
        let _span = trace_span!("window.load", ?key).entered();
        let generation = self.generation();
        self.cache.read(|cache| {
            let (page_key, page) = match key {
                None => cache.last_entry()?,
                Some(k) => cache.floor_entry(k).or_else(|| cache.first_entry())?,
            };
            Some(Window {
                page: Arc::clone(page),
                prev_key: cache.higher_entry(page_key).map(|(k, _)| k.clone()),
                next_key: cache.lower_entry(page_key).map(|(k, _)| k.clone()),
                generation,
            })
        })
    }

    /// Id to refresh around when the UI sits at `position` in `window`.
    ///
    /// Positions past the end clamp to the last item.
    pub fn refresh_key(&self, window: &Window<P>, position: usize) -> Option<ItemId> {
        let items = window.items();
        items
            .get(position.min(items.len().saturating_sub(1)))
            .map(|item| item.id.clone())
    }
}

impl<P: Send + Sync> WindowProvider for TimelineWindowSource<P> {
    fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(generation, "window source invalidated");
        // No subscribers is fine.
        let _ = self.events.send(generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[&str]) -> Page<()> {
        Page::new(ids.iter().map(|id| Item::new(*id, ())).collect(), None, None)
    }

    fn source() -> TimelineWindowSource<()> {
        let cache = SharedPageCache::new();
        cache.write(|c| {
            c.upsert(page(&["90", "80"]));
            c.upsert(page(&["70", "60"]));
            c.upsert(page(&["50", "40"]));
        });
        TimelineWindowSource::new(cache)
    }

    #[test]
    fn test_initial_window_is_newest_page() {
        let source = source();
        let window = source.load_window(None).unwrap();
        assert_eq!(window.page.key(), Some(&ItemId::from("80")));
        assert_eq!(window.prev_key, None);
        assert_eq!(window.next_key, Some(ItemId::from("60")));
    }

    #[test]
    fn test_windows_link_by_page_key() {
        let source = source();
        let window = source.load_window(Some(&ItemId::from("70"))).unwrap();
        assert_eq!(window.page.key(), Some(&ItemId::from("60")));
        assert_eq!(window.prev_key, Some(ItemId::from("80")));
        assert_eq!(window.next_key, Some(ItemId::from("40")));

        let older = source.load_window(window.next_key.as_ref()).unwrap();
        assert_eq!(older.page.key(), Some(&ItemId::from("40")));
        assert_eq!(older.next_key, None);
    }

    #[test]
    fn test_key_older_than_cache_falls_back_to_oldest() {
        let source = source();
        let window = source.load_window(Some(&ItemId::from("5"))).unwrap();
        assert_eq!(window.page.key(), Some(&ItemId::from("40")));
    }

    #[test]
    fn test_empty_cache_has_no_window() {
        let source = TimelineWindowSource::<()>::new(SharedPageCache::new());
        assert!(source.load_window(None).is_none());
    }

    #[test]
    fn test_refresh_key_clamps_position() {
        let source = source();
        let window = source.load_window(None).unwrap();
        assert_eq!(source.refresh_key(&window, 0), Some(ItemId::from("90")));
        assert_eq!(source.refresh_key(&window, 99), Some(ItemId::from("80")));
    }

    #[tokio::test]
    async fn test_invalidate_bumps_generation_and_notifies() {
        let source = source();
        let mut rx = source.subscribe();
        let window = source.load_window(None).unwrap();
        assert!(source.is_current(window.generation));

        source.invalidate();

        assert!(!source.is_current(window.generation));
        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(source.load_window(None).unwrap().generation, 1);
    }
}
