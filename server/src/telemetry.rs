//! Tracing setup and per-request database query accounting.
//!
//! Every store call opens a `db.query` span; [`DbQueryCountingLayer`] counts
//! those spans against the request that caused them.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{span::Id, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

const SERVICE_NAME: &str = "saucier-server";
const QUERY_COUNT_HEADER: &str = "X-DB-Query-Count";

tokio::task_local! {
    /// Follows the request's task across await points and worker threads.
    static QUERY_COUNTER: Arc<AtomicU32>;
}

/// Queries issued so far by the current request, if one is being tracked.
pub fn query_count() -> Option<u32> {
    QUERY_COUNTER
        .try_with(|counter| counter.load(Ordering::Relaxed))
        .ok()
}

/// Counts `db.query` spans opened inside a request scope.
///
/// Spans opened outside one (startup migrations, the detached last-search
/// write) are ignored.
pub struct DbQueryCountingLayer;

impl<S> Layer<S> for DbQueryCountingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        if span.name() == "db.query" {
            let _ = QUERY_COUNTER.try_with(|counter| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
    }
}

/// Opens a fresh query counter for the request.
///
/// Must be layered outside the TraceLayer so the counter exists before the
/// request span does.
pub async fn query_counting_middleware(request: Request<Body>, next: Next) -> Response {
    QUERY_COUNTER
        .scope(Arc::new(AtomicU32::new(0)), next.run(request))
        .await
}

/// Reports the request's query count in a response header when enabled.
pub async fn query_count_header_middleware(
    State(enabled): State<bool>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if enabled {
        if let Some(count) = query_count() {
            response
                .headers_mut()
                .insert(QUERY_COUNT_HEADER, HeaderValue::from(count));
        }
    }

    response
}

/// Console logging always; OTLP export of traces and logs when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set and the collector answers.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(DbQueryCountingLayer);

    let Some(endpoint) = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok() else {
        registry.init();
        tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only");
        return;
    };

    if !collector_reachable(&endpoint) {
        registry.init();
        tracing::info!(
            "OpenTelemetry endpoint {} not reachable, using console logging only",
            endpoint
        );
        return;
    }

    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.clone())
        .build();

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .expect("Failed to create OTLP trace exporter");
    let trace_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();
    let tracer = trace_provider.tracer(SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(trace_provider);

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .expect("Failed to create OTLP log exporter");
    let log_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(OpenTelemetryTracingBridge::new(&log_provider))
        .init();

    tracing::info!(
        "OpenTelemetry enabled, exporting traces and logs to {} as {}",
        endpoint,
        service_name
    );
}

fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://");

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}
