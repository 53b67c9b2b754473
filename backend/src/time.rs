use chrono::{DateTime, SecondsFormat, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current instant in the persisted timestamp format.
pub fn now_rfc3339() -> String {
    to_rfc3339(&Utc::now())
}

pub fn to_rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Seconds since the Unix epoch; the idempotency TTL clock.
pub fn epoch_secs() -> i64 {
    Utc::now().timestamp()
}
