use std::time::{SystemTime, UNIX_EPOCH};

use ulid::Ulid;

/// Milliseconds since UNIX epoch.
pub type EpochMs = i64;

/// Returns current unix epoch milliseconds.
pub fn now_ms() -> EpochMs {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_millis() as i64
}

/// Generates a new ULID.
pub fn new_ulid() -> Ulid {
    Ulid::new()
}

/// Rounds to the nearest integer, ties toward positive infinity.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Rounds to one decimal place, ties toward positive infinity.
pub fn round_to_tenth(x: f64) -> f64 {
    round_half_up(x * 10.0) / 10.0
}
