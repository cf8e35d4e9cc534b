//! Page cache and load orchestration for reverse-chronological feeds.
//!
//! A remote feed (a social timeline, say) pages with opaque cursors that are
//! neither stable nor aligned with each other. This crate keeps the pages a
//! session has fetched in an ordered cache and decides, for each load the
//! pager asks for, which cursor to resume from, how to keep the reading
//! position stable across a refresh, and how to install the result without
//! any reader seeing a half-built cache.
//!
//! # Architecture
//!
//! ```text
//! pager ──LoadRequest──▶ Loader ──FetchRequest──▶ RemoteTimelineClient
//!                          │
//!                          ├── SharedPageCache  (one write per load)
//!                          │         ▲
//!                          │         └── TimelineWindowSource::load_window
//!                          └── WindowProvider::invalidate
//! ```
//!
//! # Key Types
//!
//! |--------------------------|-----------------------------------------------|
//! | Type                     | Purpose                                       |
//! |--------------------------|-----------------------------------------------|
//! | [`Loader`]               | Runs Refresh / Append / Prepend loads         |
//! | [`PageCache`]            | Pages keyed by their oldest item id           |
//! | [`SharedPageCache`]      | Lock-protected handle readers and loader share|
//! | [`Page`]                 | One batch plus its neighbour cursors          |
//! | [`RemoteTimelineClient`] | Fetch seam for the actual feed                |
//! | [`WindowProvider`]       | Told when cached data changed                 |
//! |--------------------------|-----------------------------------------------|

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod page;
pub mod remote;
pub mod window;

#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;

pub use cache::{PageCache, PageEntry, SharedPageCache};
pub use config::LoaderConfig;
pub use error::{ConfigError, LoadError, RemoteDataError};
pub use loader::{LoadKind, LoadOutcome, LoadRequest, Loader};
pub use page::Page;
pub use remote::{FetchDirection, FetchRequest, RawBatch, RemoteTimelineClient};
pub use window::{TimelineWindowSource, Window, WindowProvider};

// Re-export the leaf types so callers need only this crate.
pub use scrollback_types::{Cursor, Item, ItemId, Links, item_order};

pub type Result<T> = std::result::Result<T, LoadError>;
