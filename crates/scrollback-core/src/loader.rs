//! Load orchestration: which cursor to fetch, widening, atomic install.
//!
//! # Load Protocol
//!
//! - `Refresh { anchor: None }` -> fetch the latest batch, replace the cache
//! - `Refresh { anchor: Some(id) }` -> find the page covering `id`, resume from
//!   the `prev_key` of the page just older than it, fetch that batch *and*
//!   both of its neighbours, stitch the three into one page, replace the cache
//! - `Append` -> resume from the oldest page's `next_key`, extend the cache
//! - `Prepend` -> resume from the newest page's `prev_key`, extend the cache
//!
//! Why the page just *older* than the covering one: the feed has no "page
//! containing X" call and cursors of adjacent pages do not point at each
//! other, so the only reliable way back onto the covering range is to step
//! newer-ward from the page below it.
//!
//! Every fetch happens before the cache is touched. A failed fetch, or a
//! failed neighbour during widening, leaves the cache exactly as it was.
//!
//! ```text
//!   LoadRequest ──▶ plan (read lock) ──▶ fetch ──▶ [widen: fork ─┬─ prev ─┐
//!                      │                                          └─ next ─┴─ join ─▶ merge]
//!                      ▼                                                         │
//!              EndReached / AnchorNotFound                    install (write lock) ◀┘
//!                                                                    │
//!                                                              invalidate()
//! ```

use std::sync::Arc;

use futures::future::try_join;
use scrollback_types::{Cursor, ItemId};
use tracing::{Instrument, debug, debug_span, error, info_span, trace, warn};

use crate::Result;
use crate::cache::{PageCache, SharedPageCache};
use crate::config::LoaderConfig;
use crate::error::{ConfigError, LoadError};
use crate::page::Page;
use crate::remote::{FetchDirection, FetchRequest, RemoteTimelineClient};
use crate::window::WindowProvider;

/// A load requested by the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// Rebuild the cache, optionally around the item the UI is showing.
    Refresh { anchor: Option<ItemId> },
    /// Extend toward older items.
    Append,
    /// Extend toward newer items.
    Prepend,
}

impl LoadRequest {
    pub fn kind(&self) -> LoadKind {
        match self {
            Self::Refresh { .. } => LoadKind::Refresh,
            Self::Append => LoadKind::Append,
            Self::Prepend => LoadKind::Prepend,
        }
    }
}

/// Payload-free tag of a [`LoadRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LoadKind {
    Refresh,
    Append,
    Prepend,
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub end_of_pagination_reached: bool,
}

impl LoadOutcome {
    const MORE: Self = Self {
        end_of_pagination_reached: false,
    };
    const END: Self = Self {
        end_of_pagination_reached: true,
    };
}

/// What the cache says to do before any remote call.
#[derive(Debug)]
enum Plan {
    Fetch(Option<Cursor>),
    EndReached,
}

/// Orchestrates loads for one browsing session.
///
/// Sole writer of its [`SharedPageCache`]. Loads may run concurrently with
/// each other and with readers; each one installs its result in a single
/// critical section. Two concurrent refreshes race, and keeping refreshes
/// single-flight is the scheduler's job.
pub struct Loader<C: RemoteTimelineClient> {
    client: Arc<C>,
    cache: SharedPageCache<C::Payload>,
    window: Arc<dyn WindowProvider>,
    config: LoaderConfig,
}

impl<C: RemoteTimelineClient> Loader<C> {
    /// Rejects a config that fails [`LoaderConfig::validate`].
    pub fn new(
        client: Arc<C>,
        cache: SharedPageCache<C::Payload>,
        window: Arc<dyn WindowProvider>,
        config: LoaderConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            cache,
            window,
            config,
        })
    }

    pub fn cache(&self) -> &SharedPageCache<C::Payload> {
        &self.cache
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run one load to completion.
    ///
    /// `Ok` with `end_of_pagination_reached` when there is nothing further in
    /// that direction. `Err` leaves the cache untouched; see [`LoadError`] for
    /// which errors are worth retrying.
    pub async fn load(&self, request: LoadRequest) -> Result<LoadOutcome> {
        let kind = request.kind();
        let span = info_span!("load", kind = %kind);
        self.load_inner(request).instrument(span).await
    }

    async fn load_inner(&self, request: LoadRequest) -> Result<LoadOutcome> {
        let kind = request.kind();
        let anchor = match &request {
            LoadRequest::Refresh { anchor } => anchor.clone(),
            _ => None,
        };

        let cursor = match self.plan(&request)? {
            Plan::Fetch(cursor) => cursor,
            Plan::EndReached => {
                debug!("load(), type = {kind}, no cursor at the edge: end of pagination");
                return Ok(LoadOutcome::END);
            }
        };

        debug!("load(), type = {kind}, key = {cursor:?}");

        let direction = fetch_direction(kind, cursor.as_ref());
        let mut page = self.fetch_page(cursor.clone(), direction).await?;

        // A resumed refresh must come back with enough around the anchor to
        // fill the viewport, so pull the batches on both sides as well.
        if kind == LoadKind::Refresh && cursor.is_some() {
            debug!("  refresh with non-null key, widening page");
            page = self.widen(page).await?;

            if self.config.verify {
                if let Some(anchor) = &anchor {
                    assert!(
                        page.contains(anchor),
                        "fetched page with {cursor:?}, it does not contain {anchor}"
                    );
                }
            }
        }

        if page.is_empty() {
            debug!("  empty page: end of pagination");
            return Ok(LoadOutcome::END);
        }

        let pages = self.cache.write(|cache| {
            if kind == LoadKind::Refresh {
                cache.clear();
            }
            cache.upsert(page);
            cache.log_contents();
            cache.len()
        });
        debug!("  page {kind} complete, now got {pages} pages");

        trace!("  invalidating window provider");
        self.window.invalidate();

        Ok(LoadOutcome::MORE)
    }

    /// Decide the cursor from current cache state.
    fn plan(&self, request: &LoadRequest) -> Result<Plan> {
        self.cache.read(|cache| match request {
            LoadRequest::Refresh { anchor: None } => Ok(Plan::Fetch(None)),
            LoadRequest::Refresh {
                anchor: Some(anchor),
            } => self.plan_anchored(cache, anchor).map(Plan::Fetch),
            LoadRequest::Append => Ok(cache
                .first_entry()
                .and_then(|(_, page)| page.next_key.clone())
                .map_or(Plan::EndReached, |c| Plan::Fetch(Some(c)))),
            LoadRequest::Prepend => Ok(cache
                .last_entry()
                .and_then(|(_, page)| page.prev_key.clone())
                .map_or(Plan::EndReached, |c| Plan::Fetch(Some(c)))),
        })
    }

    /// Cursor for a refresh around `anchor`; `None` falls back to a cold fetch.
    fn plan_anchored(
        &self,
        cache: &PageCache<C::Payload>,
        anchor: &ItemId,
    ) -> Result<Option<Cursor>> {
        let covering = cache
            .floor_entry(anchor)
            .filter(|(_, page)| page.contains(anchor));
        let Some((key, page)) = covering else {
            error!(%anchor, pages = cache.len(), "refresh anchor not found in the page cache");
            return Err(LoadError::AnchorNotFound(anchor.clone()));
        };

        if self.config.verify {
            assert_eq!(
                Some(key),
                page.key(),
                "page covering {anchor} is stored under the wrong key"
            );
        }

        Ok(cache
            .lower_entry(key)
            .and_then(|(_, older)| older.prev_key.clone()))
    }

    /// Fetch both neighbours of `page` concurrently and stitch all three.
    async fn widen(&self, page: Page<C::Payload>) -> Result<Page<C::Payload>> {
        let prev = self.fetch_neighbour(page.prev_key.clone(), FetchDirection::TowardNewer);
        let next = self.fetch_neighbour(page.next_key.clone(), FetchDirection::TowardOlder);
        let (prev, next) = try_join(prev, next).await?;

        debug!(
            prev = prev.as_ref().map_or(0, Page::len),
            mid = page.len(),
            next = next.as_ref().map_or(0, Page::len),
            "  merging widened pages"
        );
        Ok(page.merge(prev, next))
    }

    async fn fetch_neighbour(
        &self,
        cursor: Option<Cursor>,
        direction: FetchDirection,
    ) -> Result<Option<Page<C::Payload>>> {
        match cursor {
            Some(cursor) => self.fetch_page(Some(cursor), direction).await.map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_page(
        &self,
        cursor: Option<Cursor>,
        direction: FetchDirection,
    ) -> Result<Page<C::Payload>> {
        let request = FetchRequest {
            cursor,
            direction,
            limit: self.config.initial_load_size,
        };
        let span = debug_span!("fetch.page", %direction, cursor = ?request.cursor);
        let batch = self
            .client
            .fetch(request)
            .instrument(span)
            .await
            .inspect_err(|e| {
                warn!(%direction, "remote fetch failed: {e}");
            })?;
        let page = Page::try_from(batch).inspect_err(|e| {
            warn!(%direction, "remote rejected fetch: {e}");
        })?;
        Ok(page)
    }
}

/// Direction to page in for a load of `kind` resuming from `cursor`.
///
/// A resumed refresh pages *newer*-ward so the reading position stays put.
fn fetch_direction(kind: LoadKind, cursor: Option<&Cursor>) -> FetchDirection {
    match (kind, cursor) {
        (_, None) => FetchDirection::Latest,
        (LoadKind::Append, Some(_)) => FetchDirection::TowardOlder,
        (LoadKind::Refresh | LoadKind::Prepend, Some(_)) => FetchDirection::TowardNewer,
    }
}
