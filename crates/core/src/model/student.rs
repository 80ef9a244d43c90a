use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{AccessibilityPreferences, DifficultyLevel, StudentId};
use crate::policy::LevelTransition;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("display name cannot be empty")]
    EmptyName,

    #[error("display name is too long ({len} > {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("transition starts at {transition_from} but student is at {current}")]
    StaleTransition {
        current: DifficultyLevel,
        transition_from: DifficultyLevel,
    },

    #[error("last_active is before created_at")]
    InvalidTimeRange,
}

const MAX_NAME_LEN: usize = 100;

fn normalize_name(name: impl Into<String>) -> Result<String, StudentError> {
    let name = name.into().trim().to_owned();
    if name.is_empty() {
        return Err(StudentError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(StudentError::NameTooLong {
            len,
            max: MAX_NAME_LEN,
        });
    }
    Ok(name)
}

//
// ─── REGISTRATION ──────────────────────────────────────────────────────────────
//

/// Validated registration input; storage assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    display_name: String,
    accessibility: AccessibilityPreferences,
    created_at: DateTime<Utc>,
}

impl NewStudent {
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` or `StudentError::NameTooLong`.
    pub fn new(
        display_name: impl Into<String>,
        accessibility: AccessibilityPreferences,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudentError> {
        Ok(Self {
            display_name: normalize_name(display_name)?,
            accessibility,
            created_at,
        })
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn accessibility(&self) -> &AccessibilityPreferences {
        &self.accessibility
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Every account starts at `Easy`.
    #[must_use]
    pub fn initial_level(&self) -> DifficultyLevel {
        DifficultyLevel::Easy
    }

    #[must_use]
    pub fn assign_id(self, id: StudentId) -> Student {
        Student {
            id,
            display_name: self.display_name,
            level: DifficultyLevel::Easy,
            accessibility: self.accessibility,
            created_at: self.created_at,
            last_active: self.created_at,
        }
    }
}

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

/// A learner account.
///
/// The current difficulty level can only move through a [`LevelTransition`]
/// produced by the difficulty policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    id: StudentId,
    display_name: String,
    level: DifficultyLevel,
    accessibility: AccessibilityPreferences,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Student {
    /// Rehydrate a student from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StudentError` if the name is invalid or timestamps are inverted.
    pub fn from_persisted(
        id: StudentId,
        display_name: String,
        level: DifficultyLevel,
        accessibility: AccessibilityPreferences,
        created_at: DateTime<Utc>,
        last_active: DateTime<Utc>,
    ) -> Result<Self, StudentError> {
        if last_active < created_at {
            return Err(StudentError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            display_name: normalize_name(display_name)?,
            level,
            accessibility,
            created_at,
            last_active,
        })
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn level(&self) -> DifficultyLevel {
        self.level
    }

    #[must_use]
    pub fn accessibility(&self) -> &AccessibilityPreferences {
        &self.accessibility
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Move to the level chosen by the policy.
    ///
    /// # Errors
    ///
    /// Returns `StudentError::StaleTransition` if the transition was computed
    /// against a different starting level.
    pub fn apply_transition(&mut self, transition: &LevelTransition) -> Result<(), StudentError> {
        if transition.from() != self.level {
            return Err(StudentError::StaleTransition {
                current: self.level,
                transition_from: transition.from(),
            });
        }
        self.level = transition.to();
        Ok(())
    }

    pub fn set_accessibility(&mut self, accessibility: AccessibilityPreferences) {
        self.accessibility = accessibility;
    }

    /// Record activity; timestamps never move backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_active {
            self.last_active = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Score;
    use crate::policy::DifficultyPolicy;
    use crate::time::fixed_now;

    fn registered() -> Student {
        NewStudent::new("  Ada  ", AccessibilityPreferences::default(), fixed_now())
            .unwrap()
            .assign_id(StudentId::new(1))
    }

    #[test]
    fn registration_starts_at_easy_and_trims_name() {
        let student = registered();
        assert_eq!(student.level(), DifficultyLevel::Easy);
        assert_eq!(student.display_name(), "Ada");
        assert_eq!(student.last_active(), student.created_at());
    }

    #[test]
    fn registration_rejects_blank_name() {
        let err = NewStudent::new("   ", AccessibilityPreferences::default(), fixed_now())
            .unwrap_err();
        assert_eq!(err, StudentError::EmptyName);
    }

    #[test]
    fn applies_policy_transition() {
        let mut student = registered();
        let policy = DifficultyPolicy::default();
        let t = policy.evaluate(student.level(), &[Score::new(90.0).unwrap()]);
        student.apply_transition(&t).unwrap();
        assert_eq!(student.level(), DifficultyLevel::Medium);
    }

    #[test]
    fn rejects_stale_transition() {
        let mut student = registered();
        let policy = DifficultyPolicy::default();
        let stale = policy.evaluate(DifficultyLevel::Advanced, &[Score::new(10.0).unwrap()]);
        let err = student.apply_transition(&stale).unwrap_err();
        assert!(matches!(err, StudentError::StaleTransition { .. }));
        assert_eq!(student.level(), DifficultyLevel::Easy);
    }

    #[test]
    fn touch_is_monotonic() {
        let mut student = registered();
        let later = fixed_now() + chrono::Duration::hours(2);
        student.touch(later);
        student.touch(fixed_now());
        assert_eq!(student.last_active(), later);
    }
}
