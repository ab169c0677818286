use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;
use tlplayer_social::twitter::SearchError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    error_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_at: Option<i64>,
}

/// Error envelope returned by the API routes.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_type: &'static str,
    message: String,
    upstream_status: Option<u16>,
    reset_at: Option<OffsetDateTime>,
}

impl ApiError {
    fn new(status: StatusCode, error_type: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type,
            message: message.into(),
            upstream_status: None,
            reset_at: None,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "usage", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_type(&self) -> &'static str {
        self.error_type
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let message = err.to_string();
        match err {
            SearchError::RateLimited { until, .. } => Self {
                reset_at: Some(until),
                ..Self::new(StatusCode::TOO_MANY_REQUESTS, "ratelimit", message)
            },
            SearchError::Usage(_) => Self::usage(message),
            SearchError::Upstream { status, .. } => Self {
                upstream_status: Some(status),
                ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "upstream", message)
            },
            SearchError::Configuration(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "configuration", message)
            }
            SearchError::Transport(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "other", message)
            }
        }
    }
}

/// Whole seconds until `until`, never less than one.
fn retry_after_secs(until: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let left = until - now;
    let secs = left.whole_seconds() + i64::from(left.subsec_nanoseconds() > 0);
    secs.max(1)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error_type = self.error_type, error = %self.message, "api.error");
        } else {
            tracing::info!(error_type = self.error_type, error = %self.message, "api.rejected");
        }

        let retry_after = self
            .reset_at
            .map(|until| retry_after_secs(until, OffsetDateTime::now_utc()));
        let payload = ErrorResponse {
            error: self.message,
            error_type: self.error_type,
            upstream_status: self.upstream_status,
            reset_at: self.reset_at.map(OffsetDateTime::unix_timestamp),
        };

        let mut resp = (self.status, Json(payload)).into_response();
        if let Some(secs) = retry_after {
            resp.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
