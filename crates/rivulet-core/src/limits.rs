//! Rate-limit records parsed from provider response headers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The observed state of one rate-limited resource.
///
/// Providers expose one header triple per resource (`requests`,
/// `tokens`, `input-tokens`, ...); adapters collect them into one
/// record each. Absent headers leave the corresponding field `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// The resource the limit applies to (e.g. `"requests"`).
    pub name: String,
    /// Total allowance within the current window.
    pub limit: Option<u64>,
    /// Remaining allowance within the current window.
    pub remaining: Option<u64>,
    /// When the window resets.
    pub resets_at: Option<DateTime<Utc>>,
}

impl RateLimit {
    /// Creates an empty record for the named resource.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: None,
            remaining: None,
            resets_at: None,
        }
    }
}
