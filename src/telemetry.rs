//! Process-wide tracing and span export.
//!
//! Telemetry is an explicit service with a lifecycle — initialized once
//! from the entry point, flushed on shutdown via the returned guard —
//! rather than a side effect of module loading. Span export to the trace
//! backend is best-effort side-channel telemetry: a missing or unreachable
//! backend downgrades to local logging with a warning and never aborts the
//! pipeline.

use std::net::ToSocketAddrs;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;

const DEFAULT_HOST_CANDIDATES: [&str; 2] = ["host.docker.internal", "localhost"];
const FALLBACK_HOST: &str = "localhost";

/// Keeps the tracer provider alive for the life of the process and flushes
/// buffered spans when dropped.
pub struct TelemetryGuard {
    provider: Option<sdktrace::TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "trace exporter shutdown failed");
            }
        }
    }
}

/// Initialize the process-wide tracing subscriber and span exporter.
///
/// Installs an `EnvFilter` (from `RUST_LOG`, defaulting to `info`), a
/// console fmt layer on stderr, and — when an exporter can be constructed —
/// an OTLP span-export layer targeting the resolved backend host/port.
/// Exporter construction failure is reported as a warning; the pipeline
/// continues without span export.
///
/// Call once at startup; hold the returned guard until process exit.
#[must_use]
pub fn init_telemetry(config: &PipelineConfig) -> TelemetryGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let provider = build_tracer_provider(config);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("qa-pipeline")));

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .is_err()
    {
        tracing::warn!("tracing subscriber was already initialized");
    }

    if let Some(provider) = &provider {
        global::set_tracer_provider(provider.clone());
    }

    TelemetryGuard { provider }
}

fn build_tracer_provider(config: &PipelineConfig) -> Option<sdktrace::TracerProvider> {
    let host = resolve_trace_host(config.trace_host.as_deref(), config.trace_port);
    let endpoint = format!("http://{host}:{port}", port = config.trace_port);

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()
    {
        Ok(exporter) => exporter,
        Err(err) => {
            tracing::warn!(
                endpoint = %endpoint,
                error = %err,
                "failed to build span exporter, continuing without span export"
            );
            return None;
        }
    };

    let provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            config.service_name.clone(),
        )]))
        .build();

    tracing::info!(
        endpoint = %endpoint,
        service = %config.service_name,
        "span exporter configured"
    );
    Some(provider)
}

/// Resolve the trace-backend host.
///
/// Probing order: the explicitly configured host, then the first default
/// candidate that resolves in DNS, then a hardcoded final fallback.
fn resolve_trace_host(configured: Option<&str>, port: u16) -> String {
    if let Some(host) = configured {
        return host.to_string();
    }

    for candidate in DEFAULT_HOST_CANDIDATES {
        if (candidate, port).to_socket_addrs().is_ok() {
            return candidate.to_string();
        }
    }

    FALLBACK_HOST.to_string()
}
