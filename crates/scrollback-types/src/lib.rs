//! Shared identity and cursor types for scrollback.
//!
//! This crate is the leaf of the workspace: item identifiers and their total
//! order, the item envelope, and the opaque pagination cursors a remote feed
//! hands back. It has **no internal scrollback dependencies**.
//!
//! # Key Types
//!
//! |-----------------|-------------------------------------------------|
//! | Type            | Purpose                                         |
//! |-----------------|-------------------------------------------------|
//! | [`ItemId`]      | Feed item identity, ordered length-first        |
//! | [`Cursor`]      | Opaque resume token from the remote feed        |
//! | [`Item`]        | An id plus an opaque payload                    |
//! | [`Links`]       | `next` / `prev` cursors from a `Link` header    |
//! |-----------------|-------------------------------------------------|

pub mod ids;
pub mod item;
pub mod links;

pub use ids::{Cursor, ItemId, is_less_than, item_order};
pub use item::Item;
pub use links::{HeaderLink, LinkParseError, Links, parse_link_header};
