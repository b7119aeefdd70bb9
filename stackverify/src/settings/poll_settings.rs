use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

use super::SettingsError;

/// Budget for waiting on eventually-consistent metrics.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Total time allowed for a check to converge.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "timeout_secs")]
    pub timeout: Duration,

    /// Delay between unsuccessful evaluations.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "interval_secs")]
    pub interval: Duration,

    /// Reported when the timeout is reached.
    pub timeout_message: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            interval: Self::DEFAULT_INTERVAL,
            timeout_message: Self::DEFAULT_TIMEOUT_MESSAGE.to_string(),
        }
    }
}

impl PollSettings {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
    const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
    const DEFAULT_TIMEOUT_MESSAGE: &'static str = "Timed out waiting to get all metrics";

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timeout.is_zero() {
            return Err(Self::invalid("poll.timeout_secs", "timeout must be greater than zero"));
        }

        if self.interval.is_zero() {
            return Err(Self::invalid("poll.interval_secs", "interval must be greater than zero"));
        }

        if self.timeout < self.interval {
            return Err(Self::invalid(
                "poll.interval_secs",
                format!(
                    "interval {:?} must not exceed timeout {:?}",
                    self.interval, self.timeout
                ),
            ));
        }

        Ok(())
    }

    fn invalid(setting: &str, reason: impl Into<String>) -> SettingsError {
        SettingsError::Invalid { setting: setting.to_string(), reason: reason.into() }
    }
}
