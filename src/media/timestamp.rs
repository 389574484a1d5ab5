//! `MM:SS` timestamp conversions.

use crate::error::{Result, StepreelError};

/// Parse `MM:SS`, `HH:MM:SS`, or bare seconds into whole seconds.
pub fn timestamp_to_seconds(timestamp: &str) -> Result<u32> {
    let invalid = || StepreelError::InvalidInput(format!("Invalid timestamp: {:?}", timestamp));

    let parts: Vec<u32> = timestamp
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid())?;

    let total = match parts.as_slice() {
        [secs] => Some(*secs),
        [mins, secs] if *secs < 60 => mins.checked_mul(60).and_then(|m| m.checked_add(*secs)),
        [hours, mins, secs] if *mins < 60 && *secs < 60 => hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(mins * 60 + secs)),
        _ => None,
    };
    total.ok_or_else(invalid)
}

/// Format whole seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn seconds_to_timestamp(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format fractional seconds as `MM:SS`, truncating.
pub fn format_timestamp(seconds: f64) -> String {
    seconds_to_timestamp(seconds.max(0.0) as u32)
}
