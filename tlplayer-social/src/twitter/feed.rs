//! Pagination/retry orchestration over a [`PageSource`].
//!
//! Upstream pages are capped and often dominated by posts without media, so a
//! search walks up to `max_attempts` pages in one direction and returns the first
//! page that yields any qualifying result. Later pages are never merged in.
//! Exhausting the budget is a normal [`SearchOutcome::Exhausted`], not an error.
//! Failures abort immediately with no partial results; there is no backoff
//! between attempts.
use crate::twitter::client::PageSource;
use crate::twitter::error::SearchError;
use crate::twitter::extract::qualifying_results;
use crate::twitter::types::{Cursor, QualifyingResult, SearchPage, SearchQuery};
use std::sync::Arc;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pagination direction, relative to a cursor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Strictly below an upper bound.
    Older,
    /// Strictly above a lower bound.
    Newer,
}

impl Direction {
    /// Step one id inside the bound so an already-seen id is not returned again.
    fn inward(self, id: u64) -> u64 {
        match self {
            Direction::Older => id.saturating_sub(1),
            Direction::Newer => id.saturating_add(1),
        }
    }

    fn cursor(self, id: u64) -> Cursor {
        match self {
            Direction::Older => Cursor::MaxId(id),
            Direction::Newer => Cursor::SinceId(id),
        }
    }

    fn next_from(self, page: &SearchPage) -> Option<u64> {
        match self {
            Direction::Older => page.next_older,
            Direction::Newer => page.next_newer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Qualifying results from a single page, in page order.
    Found(Vec<QualifyingResult>),
    /// Every attempt produced a page without qualifying results.
    Exhausted { attempts: usize },
}

impl SearchOutcome {
    pub fn into_results(self) -> Vec<QualifyingResult> {
        match self {
            SearchOutcome::Found(results) => results,
            SearchOutcome::Exhausted { .. } => Vec::new(),
        }
    }
}

pub struct MediaFeed {
    source: Arc<dyn PageSource>,
    max_attempts: usize,
    page_size: u32,
}

impl MediaFeed {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self {
            source,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// Results with ids strictly below `max_id` (exclusive bound), or the most recent
    /// ones when unbounded.
    pub async fn search(
        &self,
        query: &str,
        max_id: Option<u64>,
    ) -> Result<SearchOutcome, SearchError> {
        self.run(query, Direction::Older, max_id).await
    }

    /// Results newer than `since_id`, which is required.
    pub async fn search_newer(
        &self,
        query: &str,
        since_id: Option<u64>,
    ) -> Result<SearchOutcome, SearchError> {
        let since_id = since_id
            .ok_or_else(|| SearchError::Usage("since_id is required for newer results".into()))?;
        self.run(query, Direction::Newer, Some(since_id)).await
    }

    async fn run(
        &self,
        query: &str,
        direction: Direction,
        bound: Option<u64>,
    ) -> Result<SearchOutcome, SearchError> {
        let text = query.trim();
        if text.is_empty() {
            return Err(SearchError::Usage("query must not be empty".into()));
        }

        let mut cursor = bound.map(|id| direction.inward(id));

        for attempt in 1..=self.max_attempts {
            let request = SearchQuery {
                text: text.to_string(),
                cursor: cursor.map(|id| direction.cursor(id)),
                count: self.page_size,
            };
            let page = self.source.fetch_page(&request).await.inspect_err(|e| {
                tracing::warn!(
                    target: "feed",
                    query = %text,
                    ?direction,
                    attempt,
                    error = %e,
                    "feed.attempt.failed"
                );
            })?;

            let results = qualifying_results(&page.items);
            tracing::debug!(
                target: "feed",
                query = %text,
                ?direction,
                attempt,
                cursor = ?request.cursor,
                items = page.items.len(),
                qualifying = results.len(),
                "feed.attempt"
            );

            if !results.is_empty() {
                tracing::info!(
                    target: "feed",
                    query = %text,
                    ?direction,
                    attempt,
                    results = results.len(),
                    "feed.found"
                );
                return Ok(SearchOutcome::Found(results));
            }

            // Without a reported cursor the same bound is retried.
            if let Some(next) = direction.next_from(&page) {
                cursor = Some(direction.inward(next));
            }
        }

        tracing::info!(
            target: "feed",
            query = %text,
            ?direction,
            attempts = self.max_attempts,
            "feed.exhausted"
        );
        Ok(SearchOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
