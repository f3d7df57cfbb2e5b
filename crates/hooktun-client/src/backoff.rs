//! Backoff settings as written in the manifest

use crate::duration;
use hooktun_connection::BackoffPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconnection settings from the `backoff` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    #[serde(with = "duration")]
    pub interval: Duration,
    pub multiplier: f64,
    #[serde(with = "duration")]
    pub max_interval: Duration,
    #[serde(with = "duration")]
    pub max_time: Duration,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
            max_time: Duration::from_secs(15 * 60),
        }
    }
}

impl From<&BackoffSettings> for BackoffPolicy {
    fn from(settings: &BackoffSettings) -> Self {
        BackoffPolicy {
            initial_interval: settings.interval,
            multiplier: settings.multiplier,
            max_interval: settings.max_interval,
            max_elapsed_time: settings.max_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mapping() {
        let settings = BackoffSettings {
            interval: Duration::from_secs(1),
            multiplier: 3.0,
            max_interval: Duration::from_secs(30),
            max_time: Duration::from_secs(600),
        };

        let policy = BackoffPolicy::from(&settings);

        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 3.0);
        assert_eq!(policy.max_interval, Duration::from_secs(30));
        assert_eq!(policy.max_elapsed_time, Duration::from_secs(600));
    }

    #[test]
    fn test_degenerate_values_pass_through() {
        let settings = BackoffSettings {
            interval: Duration::ZERO,
            multiplier: -2.0,
            max_interval: Duration::ZERO,
            max_time: Duration::ZERO,
        };

        let policy = BackoffPolicy::from(&settings);

        assert_eq!(policy.initial_interval, Duration::ZERO);
        assert_eq!(policy.multiplier, -2.0);
        assert_eq!(policy.max_interval, Duration::ZERO);
        assert_eq!(policy.max_elapsed_time, Duration::ZERO);
    }

    #[test]
    fn test_defaults_match_policy_defaults() {
        assert_eq!(
            BackoffPolicy::from(&BackoffSettings::default()),
            BackoffPolicy::default()
        );
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let settings: BackoffSettings = serde_yaml::from_str("multiplier: 2\ninterval: 1s").unwrap();

        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.multiplier, 2.0);
        assert_eq!(settings.max_interval, Duration::from_secs(60));
        assert_eq!(settings.max_time, Duration::from_secs(900));
    }

    #[test]
    fn test_integer_seconds() {
        let settings: BackoffSettings = serde_yaml::from_str("max_time: 120").unwrap();
        assert_eq!(settings.max_time, Duration::from_secs(120));
    }
}
