use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuses a client supplied request id, otherwise mints one.
fn request_id(req: &Request) -> String {
    req.headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Route template when axum matched one, so `/api/room/7` and
/// `/api/room/8` land under the same key.
pub(crate) fn route_of(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Served,
    Rejected,
    Failed,
}

fn outcome_of(status: StatusCode) -> Outcome {
    if status.is_server_error() {
        Outcome::Failed
    } else if status.is_client_error() {
        Outcome::Rejected
    } else {
        Outcome::Served
    }
}

/// Wraps every request in a span carrying its id and route, and echoes the
/// id back in `x-request-id`.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request_id(&req);
    let span = info_span!(
        "http",
        request_id = %request_id,
        method = %req.method(),
        route = %route_of(&req),
    );

    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let _entered = span.enter();
    match outcome_of(status) {
        Outcome::Failed => error!(status = status.as_u16(), elapsed_ms, "request failed"),
        Outcome::Rejected => warn!(status = status.as_u16(), elapsed_ms, "request rejected"),
        Outcome::Served => info!(status = status.as_u16(), elapsed_ms, "request served"),
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

/// Where and how loudly the process logs. Read from the environment once at
/// startup.
struct LogSettings {
    dir: String,
    otlp_endpoint: String,
    environment: String,
}

impl LogSettings {
    fn from_env() -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_owned());
        Self {
            dir: var("LOG_DIR", "storage/logs"),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            environment: var("ENVIRONMENT", "development"),
        }
    }
}

fn init_tracer(settings: &LogSettings) -> Result<Tracer, TraceError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new([
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", settings.environment.clone()),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(settings.otlp_endpoint.clone()),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

/// Installs the global subscriber:
///
/// * compact console output, filtered by `RUST_LOG`
/// * `wardmap.log`, errors only, rotated daily under `LOG_DIR`
/// * `wardmap.json`, info and up as JSON lines for log shipping
/// * an OTLP exporter when one can be built
pub fn init_tracing() -> std::io::Result<()> {
    let settings = LogSettings::from_env();
    std::fs::create_dir_all(&settings.dir)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}=info,tower_http=warn,sqlx=warn", env!("CARGO_CRATE_NAME")))
    });

    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let errors = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, &settings.dir, "wardmap.log"))
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new("error"));

    let structured = fmt::layer()
        .json()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, &settings.dir, "wardmap.json"))
        .with_current_span(true)
        .with_span_list(false)
        .with_filter(EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .with(structured);

    match init_tracer(&settings) {
        Ok(tracer) => {
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init();
            info!(
                log_dir = %settings.dir,
                otlp = %settings.otlp_endpoint,
                "logging ready, exporting traces"
            );
        }
        Err(e) => {
            registry.init();
            warn!(log_dir = %settings.dir, error = %e, "logging ready, trace export unavailable");
        }
    }

    Ok(())
}

/// Flushes pending spans before exit.
pub async fn shutdown_tracer() {
    global::shutdown_tracer_provider();
    info!("trace exporter flushed");
}
