//! UTC instants carried on messages and adapter state.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Serializes as RFC 3339 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Accepts any offset an upstream API sends and normalizes to UTC.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        let parsed = DateTime::parse_from_rfc3339(value).ok()?;
        Some(Self(parsed.with_timezone(&Utc)))
    }

    /// Second precision with a `Z` suffix, the form viewers receive.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
