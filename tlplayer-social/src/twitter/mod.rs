//! Twitter/X search surface consumed by the HTTP server.
//!
//! Data flows `credential` → `client` (guarded by `rate`) → `extract` → `feed`.
//! The gate and the credential provider are process-wide and shared by handle;
//! construct them once and pass `Arc`s to every [`TwitterApi`].
pub mod client;
pub mod credential;
pub mod error;
pub mod extract;
pub mod feed;
pub mod rate;
pub mod types;

pub use client::{PageSource, TwitterApi};
pub use credential::{Credential, CredentialProvider};
pub use error::SearchError;
pub use feed::{Direction, MediaFeed, SearchOutcome};
pub use rate::{GateStatus, RateKey, RateLimitGate};
pub use types::{Cursor, MediaKind, QualifyingResult, SearchPage, SearchQuery};
