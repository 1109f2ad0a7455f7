use axum::{Router, extract::Request, middleware::Next, response::Response, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use wardmap_models::{LogMethod, LogType};

use crate::logging::route_of;

const REQUEST_DURATION: &str = "wardmap_http_request_duration_seconds";
const REQUESTS_TOTAL: &str = "wardmap_http_requests_total";
const REQUESTS_IN_FLIGHT: &str = "wardmap_http_requests_in_flight";

/// Upload handlers run in the hundreds of milliseconds, so the upper buckets
/// stretch further than for plain JSON routes.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Off when `OBSERVABILITY_ENABLED` is `false` or `0`.
pub fn is_observability_enabled() -> bool {
    *ENABLED.get_or_init(|| {
        !matches!(
            std::env::var("OBSERVABILITY_ENABLED").map(|v| v.to_ascii_lowercase()),
            Ok(v) if v == "false" || v == "0"
        )
    })
}

/// Installs the Prometheus recorder, or does nothing when observability is
/// switched off.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_owned()), DURATION_BUCKETS)?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(5));
        loop {
            tick.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let started = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = route_of(&req);

    let in_flight = gauge!(REQUESTS_IN_FLIGHT);
    in_flight.increment(1.0);
    let response = next.run(req).await;
    in_flight.decrement(1.0);

    let status = response.status().as_u16().to_string();
    histogram!(REQUEST_DURATION, "method" => method.clone(), "route" => route.clone())
        .record(started.elapsed().as_secs_f64());
    counter!(REQUESTS_TOTAL, "method" => method, "route" => route, "status" => status).increment(1);

    response
}

/// Standalone app serving the scrape endpoint on its own port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

fn when_enabled(record: impl FnOnce()) {
    if is_observability_enabled() {
        record();
    }
}

pub fn track_audit_entry(log_type: LogType, method: LogMethod) {
    when_enabled(|| {
        counter!(
            "wardmap_audit_entries_total",
            "type" => log_type.as_str(),
            "method" => method.as_str()
        )
        .increment(1)
    });
}

pub fn track_user_login_success() {
    when_enabled(|| counter!("wardmap_logins_total", "outcome" => "success").increment(1));
}

pub fn track_user_login_failure(reason: &'static str) {
    when_enabled(|| {
        counter!("wardmap_logins_total", "outcome" => "failure", "reason" => reason).increment(1)
    });
}

/// `kind` is one of `access`, `refresh`, `reset`.
pub fn track_jwt_issued(kind: &'static str) {
    when_enabled(|| counter!("wardmap_tokens_issued_total", "kind" => kind).increment(1));
}

/// `category` is `floor` or `room`.
pub fn track_images_uploaded(category: &'static str, count: usize) {
    when_enabled(|| {
        counter!("wardmap_images_uploaded_total", "category" => category).increment(count as u64)
    });
}
