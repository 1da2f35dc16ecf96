//! Roost Core - Shared Types
//!
//! Errors, configuration, time source and telemetry bootstrap shared by the
//! cache layer (`roost-storage`) and the revenue engine (`roost-revenue`).
//! This crate holds no cache or aggregation logic.

pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RoostConfig;
pub use error::{
    ConfigError, FetchError, RoostError, RoostResult, StorageError, ValidationError,
};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Short month labels in calendar order, as used by chart sources.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Resolve a month label ("Jan", "january", "SEP") to a zero-based month index.
///
/// Matching is case-insensitive on the first three letters.
pub fn month_index(label: &str) -> Option<u32> {
    let trimmed = label.trim();
    let prefix = trimmed.get(..3)?;
    MONTH_LABELS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(prefix))
        .map(|i| i as u32)
}

/// Short label for a zero-based month index.
pub fn month_label(month0: u32) -> &'static str {
    MONTH_LABELS[(month0 % 12) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_index_short_and_long() {
        assert_eq!(month_index("Jan"), Some(0));
        assert_eq!(month_index("december"), Some(11));
        assert_eq!(month_index(" SEP "), Some(8));
    }

    #[test]
    fn test_month_index_rejects_garbage() {
        assert_eq!(month_index(""), None);
        assert_eq!(month_index("Q1"), None);
        assert_eq!(month_index("Foo"), None);
    }

    #[test]
    fn test_month_label_wraps() {
        assert_eq!(month_label(0), "Jan");
        assert_eq!(month_label(11), "Dec");
        assert_eq!(month_label(12), "Jan");
    }
}
