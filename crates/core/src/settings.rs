use serde::Serialize;

use crate::policy::{PolicyError, PolicySettings};
use crate::progress::TimeWindow;

/// Tunables for the adaptive engine, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineSettings {
    policy: PolicySettings,
    summary_window: TimeWindow,
}

impl EngineSettings {
    /// # Errors
    ///
    /// Returns `PolicyError` if the rolling-window parameters are inconsistent.
    pub fn new(
        policy_window: usize,
        policy_min_results: usize,
        summary_window: TimeWindow,
    ) -> Result<Self, PolicyError> {
        Ok(Self {
            policy: PolicySettings::new(policy_window, policy_min_results)?,
            summary_window,
        })
    }

    #[must_use]
    pub fn policy(&self) -> PolicySettings {
        self.policy
    }

    /// Window used for the summary returned with each quiz submission.
    #[must_use]
    pub fn summary_window(&self) -> TimeWindow {
        self.summary_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_latest_score_and_week() {
        let settings = EngineSettings::default();
        assert_eq!(settings.policy().window(), 1);
        assert_eq!(settings.summary_window(), TimeWindow::Week);
    }

    #[test]
    fn invalid_policy_is_rejected() {
        assert!(EngineSettings::new(0, 0, TimeWindow::Month).is_err());
        let ok = EngineSettings::new(3, 2, TimeWindow::Month).unwrap();
        assert!(ok.policy().is_rolling());
    }
}
