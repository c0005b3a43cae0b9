//! Request telemetry, the Prometheus endpoint and response hardening.

use axum::{
    Extension,
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::auth::AuthenticatedAccount;
use super::{ApiError, AppState};
use crate::domain::AccountId;

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    // Responses carry tokens and profile data
    ("cache-control", "no-store"),
];

/// How a request ended, as seen by the accounts API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Rejected,
    Unauthenticated,
    Forbidden,
    Failed,
}

impl Outcome {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthenticated,
            StatusCode::FORBIDDEN => Self::Forbidden,
            s if s.is_server_error() => Self::Failed,
            s if s.is_client_error() => Self::Rejected,
            _ => Self::Ok,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Rejected => "rejected",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Failed => "failed",
        }
    }
}

/// `GET /api/metrics`, staff only.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Result<String, ApiError> {
    if !account.is_staff {
        warn!(account_id = %account.id, "Non-staff account requested metrics");
        return Err(ApiError::forbidden());
    }

    state
        .prometheus_handle
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::NotFound("Metrics are not enabled".to_string()))
}

/// Wraps each request in a span and records one `http_request_finished`
/// event plus the HTTP metrics. `user_id` on the span is filled in by the
/// auth middleware; the account id also comes back on the response.
pub async fn request_telemetry(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
        .to_string();

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let outcome = Outcome::from_status(response.status());
        let account_id = response.extensions().get::<AccountId>().copied();

        metrics::counter!(
            "http_requests_total",
            "method" => method,
            "route" => route.clone(),
            "outcome" => outcome.as_str(),
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds", "route" => route)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let account_id = account_id.map(|id| id.value());
        if outcome == Outcome::Failed {
            warn!(
                event = "http_request_finished",
                status_code = response.status().as_u16(),
                outcome = outcome.as_str(),
                account_id,
                duration_ms,
                "Request failed"
            );
        } else {
            info!(
                event = "http_request_finished",
                status_code = response.status().as_u16(),
                outcome = outcome.as_str(),
                account_id,
                duration_ms,
                "Request finished"
            );
        }

        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}
