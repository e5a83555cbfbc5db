//! Rate-limit header parsing.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

use rivulet_core::limits::RateLimit;

const HEADER_PREFIX: &str = "anthropic-ratelimit-";

/// Extract rate-limit records and the `retry-after` hint from response
/// headers.
///
/// Headers follow `anthropic-ratelimit-<resource>-<field>` where
/// `<field>` is `limit`, `remaining`, or `reset` and `<resource>` may
/// itself contain dashes (`input-tokens`), so the field is matched as a
/// suffix. Records come back in first-seen header order; absent headers
/// yield an empty list and `None`.
pub(crate) fn parse_rate_limit_headers(headers: &HeaderMap) -> (Vec<RateLimit>, Option<u64>) {
    let mut records: Vec<RateLimit> = Vec::new();

    for (name, value) in headers {
        let Some(rest) = name.as_str().strip_prefix(HEADER_PREFIX) else {
            continue;
        };
        let Ok(value) = value.to_str() else {
            continue;
        };

        if let Some(resource) = rest.strip_suffix("-limit") {
            record_for(&mut records, resource).limit = value.parse().ok();
        } else if let Some(resource) = rest.strip_suffix("-remaining") {
            record_for(&mut records, resource).remaining = value.parse().ok();
        } else if let Some(resource) = rest.strip_suffix("-reset") {
            record_for(&mut records, resource).resets_at = parse_reset(value);
        }
    }

    let retry_after = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());

    (records, retry_after)
}

fn record_for<'a>(records: &'a mut Vec<RateLimit>, resource: &str) -> &'a mut RateLimit {
    let pos = match records.iter().position(|r| r.name == resource) {
        Some(pos) => pos,
        None => {
            records.push(RateLimit::new(resource));
            records.len() - 1
        }
    };
    &mut records[pos]
}

fn parse_reset(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
