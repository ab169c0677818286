use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use time::OffsetDateTime;

/// Endpoint category a cooldown applies to.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RateKey(pub String);

impl RateKey {
    pub const SEARCH: &'static str = "search";

    pub fn search() -> Self {
        Self(Self::SEARCH.to_string())
    }
}

impl From<&str> for RateKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Open,
    CoolingDown { until: OffsetDateTime },
}

/// Per-category cooldown tracker shared by every upstream caller.
///
/// Semantics:
/// - A category has an entry exactly while it is believed to be cooling down.
/// - `check` returns the stored expiry while it lies in the future; the first
///   `check` at or after expiry removes the entry and reports `Open`.
/// - `record_rejection` overwrites the expiry unconditionally.
///
/// Expired entries are removed lazily on read, never swept.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    cooldowns: DashMap<RateKey, OffsetDateTime>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &RateKey) -> GateStatus {
        self.check_at(key, OffsetDateTime::now_utc())
    }

    /// [`Self::check`] against an explicit clock reading.
    pub fn check_at(&self, key: &RateKey, now: OffsetDateTime) -> GateStatus {
        // The entry guard holds the shard lock, so the expiry test and the removal
        // cannot interleave with a concurrent `record_rejection` on the same key.
        match self.cooldowns.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let until = *entry.get();
                if now < until {
                    GateStatus::CoolingDown { until }
                } else {
                    entry.remove();
                    tracing::debug!(target: "rate", key=%key, %until, "rate.cooldown.expired");
                    GateStatus::Open
                }
            }
            Entry::Vacant(_) => GateStatus::Open,
        }
    }

    pub fn record_rejection(&self, key: &RateKey, until: OffsetDateTime) {
        tracing::info!(target: "rate", key=%key, %until, "rate.cooldown.recorded");
        self.cooldowns.insert(key.clone(), until);
    }

    /// Whether an entry is currently stored for `key` (expired or not).
    #[cfg(test)]
    fn is_tracked(&self, key: &RateKey) -> bool {
        self.cooldowns.contains_key(key)
    }
}
