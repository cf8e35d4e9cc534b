//! Tracing setup for scrollback binaries, with optional OpenTelemetry export.
//!
//! [`init_tracing`] installs an `EnvFilter` (default `info`, override with
//! `RUST_LOG`) and a stderr fmt layer. Built with the `telemetry` feature, it
//! also adds an OTLP layer when the standard OTel environment variables ask
//! for one:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 cargo run -p scrollback-cli \
//!     --features telemetry -- refresh append
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to disable export even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

#[cfg(feature = "telemetry")]
pub use otel::{OtelGuard, otel_layer};

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),

    #[error("OTLP export needs a running Tokio runtime")]
    NoRuntime,
}

/// Check whether OTel export should be enabled.
///
/// True when `OTEL_SDK_DISABLED` is not `"true"` and either
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set or `OTEL_TRACES_EXPORTER` is set to
/// something other than `"none"`.
pub fn otel_enabled() -> bool {
    otel_enabled_with(|key| std::env::var(key).ok())
}

fn otel_enabled_with(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }
    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }
    var("OTEL_TRACES_EXPORTER").is_some_and(|exporter| !exporter.eq_ignore_ascii_case("none"))
}

/// Sampling rate for a span, by name prefix.
///
/// | Prefix     | Rate | |
/// |------------|------|-|
/// | `load*`    | 100% | One per pager request |
/// | `fetch*`   | 10%  | Up to three per load, even under a kept `load` |
/// | `window*`  | 1%   | Every UI rebuild      |
/// | other      | 10%  | Kept whenever the parent is |
pub fn sample_rate(span_name: &str) -> f64 {
    if span_name.starts_with("load") {
        1.0
    } else if span_name.starts_with("window") {
        0.01
    } else {
        0.1
    }
}

/// Whether a span inherits a sampled parent's decision.
///
/// `fetch*` and `window*` spans always apply their own [`sample_rate`].
pub fn follows_parent(span_name: &str) -> bool {
    !(span_name.starts_with("fetch") || span_name.starts_with("window"))
}

/// Keeps exporters alive; drop it last, on the way out of `main`.
#[must_use = "dropping the guard stops trace export"]
pub struct TracingGuard {
    #[cfg(feature = "telemetry")]
    _otel: Option<OtelGuard>,
}

/// Install the global subscriber for a binary named `service_name`.
///
/// Export problems are reported on stderr and fall back to local logging.
pub fn init_tracing(service_name: &str) -> TracingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(feature = "telemetry")]
    {
        if otel_enabled() {
            match otel_layer(service_name) {
                Ok((layer, guard)) => {
                    registry.with(layer).init();
                    return TracingGuard { _otel: Some(guard) };
                }
                Err(e) => eprintln!("OTel disabled: {e}"),
            }
        }
        registry.init();
        TracingGuard { _otel: None }
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = service_name;
        registry.init();
        TracingGuard {}
    }
}
