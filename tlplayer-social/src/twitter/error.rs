use thiserror::Error;
use time::OffsetDateTime;
use tlplayer_http::HttpError;

/// Failures surfaced by the search client and the feed orchestrator.
///
/// An empty search is not an error; see [`super::SearchOutcome`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// The endpoint category is cooling down until `until`, either because upstream
    /// just rejected a call or because an earlier rejection is still in force.
    #[error("rate limited on `{category}` until {until}")]
    RateLimited {
        category: String,
        until: OffsetDateTime,
    },

    /// Upstream answered with a non-success status other than a quota rejection.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Credential material is missing, unreadable, or was refused.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required request parameter is missing or malformed.
    #[error("usage error: {0}")]
    Usage(String),

    /// Network or decode failure talking to upstream.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),
}
