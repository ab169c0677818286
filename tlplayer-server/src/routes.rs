use crate::AppState;
use crate::error::{ApiError, ApiResult};
use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use tlplayer_social::twitter::QualifyingResult;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub max_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewerParams {
    pub q: Option<String>,
    pub since_id: Option<String>,
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

pub async fn healthz() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// `GET /api/search`: media posts with ids below `max_id`, newest first.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<QualifyingResult>>> {
    let max_id = parse_id("max_id", params.max_id.as_deref())?;
    let outcome = state
        .feed
        .search(params.q.as_deref().unwrap_or_default(), max_id)
        .await?;
    Ok(Json(outcome.into_results()))
}

/// `GET /api/search-newer`: media posts newer than `since_id`, in upstream page
/// order (newest first).
pub async fn search_newer(
    State(state): State<AppState>,
    Query(params): Query<NewerParams>,
) -> ApiResult<Json<Vec<QualifyingResult>>> {
    let since_id = parse_id("since_id", params.since_id.as_deref())?;
    let outcome = state
        .feed
        .search_newer(params.q.as_deref().unwrap_or_default(), since_id)
        .await?;
    Ok(Json(outcome.into_results()))
}

/// Blank values count as absent.
fn parse_id(name: &str, raw: Option<&str>) -> Result<Option<u64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::usage(format!("{name} must be a numeric id, got `{s}`"))),
    }
}
