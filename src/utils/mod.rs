//! Utility functions and helpers

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// The engine never installs one on its own; the embedding node (or a
/// test harness) calls this once at startup with the values from
/// [`crate::config::LoggingConfig`]. An unparseable `level` falls back
/// to `info`, and calls after a subscriber is already installed are
/// no-ops, so repeated initialization is harmless.
pub fn init_logging(level: &str, format: &str) {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
    };

    // An earlier subscriber wins; nothing to do here.
    let _ = installed;
}

/// Format a hashrate for display
pub fn format_hashrate(rate: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (1_000_000_000_000, "TH/s"),
        (1_000_000_000, "GH/s"),
        (1_000_000, "MH/s"),
        (1_000, "KH/s"),
    ];

    for (scale, unit) in UNITS {
        if rate >= scale {
            return format!("{:.2} {}", rate as f64 / scale as f64, unit);
        }
    }
    format!("{} H/s", rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug", "plain");
        // A subscriber is installed now; these must be silent no-ops.
        init_logging("info", "json");
        init_logging("trace", "plain");
    }

    #[test]
    fn test_init_logging_bad_level_falls_back() {
        init_logging("not[a(filter", "plain");
    }

    #[test]
    fn test_format_hashrate() {
        assert_eq!(format_hashrate(0), "0 H/s");
        assert_eq!(format_hashrate(500), "500 H/s");
        assert_eq!(format_hashrate(1_500), "1.50 KH/s");
        assert_eq!(format_hashrate(2_500_000), "2.50 MH/s");
        assert_eq!(format_hashrate(3_500_000_000), "3.50 GH/s");
        assert_eq!(format_hashrate(4_500_000_000_000), "4.50 TH/s");
        assert_eq!(format_hashrate(u64::MAX), "18446744.07 TH/s");
    }
}
