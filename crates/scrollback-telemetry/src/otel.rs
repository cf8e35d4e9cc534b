//! OTLP tracing layer and sampler.

use opentelemetry::trace::{
    Link, SamplingDecision, SamplingResult, SpanKind, TraceContextExt, TraceId, TraceState,
    TracerProvider as _,
};
use opentelemetry::{Context, KeyValue, global};
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider, ShouldSample};
use tracing_opentelemetry::OpenTelemetryLayer;

use crate::{TelemetryError, follows_parent, sample_rate};

/// Shuts the tracer provider down on drop, flushing pending spans.
pub struct OtelGuard {
    provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("OTel shutdown error: {e}");
        }
    }
}

/// Build an OpenTelemetry tracing layer and its guard.
///
/// Must be called inside a Tokio runtime; the batch exporter spawns onto it.
pub fn otel_layer<S>(
    service_name: &str,
) -> Result<(OpenTelemetryLayer<S, SdkTracer>, OtelGuard), TelemetryError>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(ScrollbackSampler)
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer("scrollback");
    let layer = tracing_opentelemetry::layer().with_tracer(tracer);

    Ok((layer, OtelGuard { provider }))
}

/// Rates per [`sample_rate`]. Errors are always kept, and so is any span
/// under a sampled parent unless [`follows_parent`] says otherwise.
#[derive(Debug, Clone)]
struct ScrollbackSampler;

impl ShouldSample for ScrollbackSampler {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        trace_id: TraceId,
        name: &str,
        span_kind: &SpanKind,
        attributes: &[KeyValue],
        links: &[Link],
    ) -> SamplingResult {
        if let Some(cx) = parent_context.filter(|_| follows_parent(name)) {
            let parent_span = cx.span();
            let parent_ctx = parent_span.span_context();
            if parent_ctx.is_sampled() {
                return SamplingResult {
                    decision: SamplingDecision::RecordAndSample,
                    attributes: vec![],
                    trace_state: parent_ctx.trace_state().clone(),
                };
            }
        }

        let is_error = attributes.iter().any(|kv| {
            (kv.key.as_str() == "otel.status_code" && kv.value.as_str() == "ERROR")
                || (kv.key.as_str() == "error" && kv.value.as_str() == "true")
        });
        if is_error {
            return SamplingResult {
                decision: SamplingDecision::RecordAndSample,
                attributes: vec![],
                trace_state: TraceState::default(),
            };
        }

        Sampler::TraceIdRatioBased(sample_rate(name)).should_sample(
            parent_context,
            trace_id,
            name,
            span_kind,
            attributes,
            links,
        )
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::{SpanContext, SpanId, TraceFlags};

    use super::*;

    /// Lowest-probability trace id: only a 100% rate keeps it.
    fn unlucky() -> TraceId {
        TraceId::from_bytes([0xff; 16])
    }

    fn sampled_parent() -> Context {
        Context::new().with_remote_span_context(SpanContext::new(
            unlucky(),
            SpanId::from_bytes([1; 8]),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        ))
    }

    fn decide(parent: &Context, name: &str) -> SamplingDecision {
        ScrollbackSampler
            .should_sample(Some(parent), unlucky(), name, &SpanKind::Internal, &[], &[])
            .decision
    }

    #[test]
    fn test_sampled_parent_keeps_load_children() {
        let parent = sampled_parent();
        assert!(matches!(
            decide(&parent, "load"),
            SamplingDecision::RecordAndSample
        ));
        assert!(matches!(
            decide(&parent, "merge"),
            SamplingDecision::RecordAndSample
        ));
    }

    #[test]
    fn test_fetch_and_window_keep_their_own_rate() {
        let parent = sampled_parent();
        assert!(matches!(decide(&parent, "fetch.page"), SamplingDecision::Drop));
        assert!(matches!(decide(&parent, "window.load"), SamplingDecision::Drop));
    }

    #[test]
    fn test_errors_always_kept() {
        let error = [KeyValue::new("otel.status_code", "ERROR")];
        let result = ScrollbackSampler.should_sample(
            None,
            unlucky(),
            "fetch.page",
            &SpanKind::Internal,
            &error,
            &[],
        );
        assert!(matches!(result.decision, SamplingDecision::RecordAndSample));
    }
}
