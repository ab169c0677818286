//! Thin wrapper around the v1.1 standard search endpoint.
//!
//! Every call consults the shared [`RateLimitGate`] first and fails fast while the
//! `search` category is cooling down. A 429 from upstream records the cooldown from
//! `x-rate-limit-reset` before the error is returned. No retries happen here; the
//! feed orchestrator decides what to do with an empty page.
use crate::twitter::credential::CredentialProvider;
use crate::twitter::error::SearchError;
use crate::twitter::rate::{GateStatus, RateKey, RateLimitGate};
use crate::twitter::types::{Cursor, SearchPage, SearchQuery, SearchResponse};
use async_trait::async_trait;
use std::borrow::Cow;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tlplayer_http::{Auth, HttpClient, HttpError, RequestOpts};

pub const SEARCH_PATH: &str = "1.1/search/tweets.json";

/// Cooldown assumed when a 429 arrives without a usable reset header; matches the
/// upstream's 15 minute quota window.
const FALLBACK_COOLDOWN: Duration = Duration::minutes(15);

/// Source of search pages; implemented by [`TwitterApi`] and by test doubles.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, query: &SearchQuery) -> Result<SearchPage, SearchError>;
}

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    credentials: Arc<CredentialProvider>,
    gate: Arc<RateLimitGate>,
    rate_key: RateKey,
}

impl TwitterApi {
    pub fn new(
        http: HttpClient,
        credentials: Arc<CredentialProvider>,
        gate: Arc<RateLimitGate>,
    ) -> Self {
        Self {
            http,
            credentials,
            gate,
            rate_key: RateKey::search(),
        }
    }

    fn rejection(&self, err: HttpError) -> SearchError {
        match err {
            HttpError::Api {
                status,
                body,
                rate_limit,
                ..
            } if status.as_u16() == 429 => {
                let until = rate_limit
                    .reset
                    .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            target: "twitter",
                            body_len = body.len(),
                            "twitter.search.rate_limited.no_reset_header"
                        );
                        OffsetDateTime::now_utc() + FALLBACK_COOLDOWN
                    });
                self.gate.record_rejection(&self.rate_key, until);
                SearchError::RateLimited {
                    category: self.rate_key.to_string(),
                    until,
                }
            }
            HttpError::Api { status, body, .. } => SearchError::Upstream {
                status: status.as_u16(),
                body,
            },
            other => SearchError::Transport(other),
        }
    }
}

#[async_trait]
impl PageSource for TwitterApi {
    async fn fetch_page(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        if let GateStatus::CoolingDown { until } = self.gate.check(&self.rate_key) {
            tracing::debug!(
                target: "twitter",
                key = %self.rate_key,
                %until,
                "twitter.search.suppressed"
            );
            return Err(SearchError::RateLimited {
                category: self.rate_key.to_string(),
                until,
            });
        }

        let credential = self.credentials.get().await?;

        let mut params: Vec<(&str, Cow<'_, str>)> = vec![
            ("q", Cow::Borrowed(query.text.as_str())),
            ("count", query.count.to_string().into()),
            ("result_type", "recent".into()),
            ("tweet_mode", "extended".into()),
        ];
        match query.cursor {
            Some(Cursor::SinceId(id)) => params.push(("since_id", id.to_string().into())),
            Some(Cursor::MaxId(id)) => params.push(("max_id", id.to_string().into())),
            None => {}
        }

        let resp: SearchResponse = self
            .http
            .get_json(
                SEARCH_PATH,
                RequestOpts {
                    auth: Some(Auth::Bearer(credential.bearer_token())),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| self.rejection(e))?;

        let page = SearchPage::from(resp);
        tracing::debug!(
            target: "twitter",
            query = %query.text,
            cursor = ?query.cursor,
            items = page.items.len(),
            next_older = ?page.next_older,
            next_newer = ?page.next_newer,
            "twitter.search.page"
        );
        Ok(page)
    }
}
