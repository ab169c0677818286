//! Social network clients and the media feed built on top of them.
//!
//! Only the Twitter/X v1.1 search pipeline is implemented: see [`twitter`] for the
//! credential provider, the per-endpoint cooldown gate, the search client, media
//! extraction, and the pagination orchestrator that ties them together.
pub mod twitter;
