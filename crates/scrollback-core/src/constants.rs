//! Engine configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Items requested per remote fetch unless configured otherwise.
pub const PAGE_SIZE: usize = 30;

/// Capacity of the window invalidation broadcast channel. Subscribers that
/// lag further than this only need the latest generation anyway.
pub const INVALIDATION_CHANNEL_CAPACITY: usize = 16;

/// Service name for logs and traces when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "scrollback";
