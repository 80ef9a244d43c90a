use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DifficultyLevel, LessonId, StudentId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum LessonProgressError {
    #[error("progress percent must be in 0..=100, got {0}")]
    InvalidPercent(f64),

    #[error("unknown lesson status: {0}")]
    UnknownStatus(String),

    #[error("completed lesson is missing completed_at")]
    MissingCompletedAt,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = LessonProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(LessonProgressError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// A student's progress through one lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonProgress {
    student_id: StudentId,
    lesson_id: LessonId,
    status: LessonStatus,
    progress_percent: f64,
    difficulty_used: DifficultyLevel,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    last_accessed: DateTime<Utc>,
}

impl LessonProgress {
    /// First access of a lesson: the student is now working through it.
    #[must_use]
    pub fn start(
        student_id: StudentId,
        lesson_id: LessonId,
        difficulty_used: DifficultyLevel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            student_id,
            lesson_id,
            status: LessonStatus::InProgress,
            progress_percent: 0.0,
            difficulty_used,
            started_at: Some(now),
            completed_at: None,
            last_accessed: now,
        }
    }

    /// Rehydrate from storage.
    ///
    /// # Errors
    ///
    /// Returns `LessonProgressError` if the percent is out of range or a
    /// completed lesson has no completion time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        student_id: StudentId,
        lesson_id: LessonId,
        status: LessonStatus,
        progress_percent: f64,
        difficulty_used: DifficultyLevel,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        last_accessed: DateTime<Utc>,
    ) -> Result<Self, LessonProgressError> {
        validate_percent(progress_percent)?;
        if status == LessonStatus::Completed && completed_at.is_none() {
            return Err(LessonProgressError::MissingCompletedAt);
        }
        Ok(Self {
            student_id,
            lesson_id,
            status,
            progress_percent,
            difficulty_used,
            started_at,
            completed_at,
            last_accessed,
        })
    }

    /// Re-open an existing lesson. Completed lessons stay completed.
    pub fn reopen(&mut self, difficulty_used: DifficultyLevel, now: DateTime<Utc>) {
        if self.status == LessonStatus::NotStarted {
            self.status = LessonStatus::InProgress;
            self.started_at.get_or_insert(now);
        }
        if self.status == LessonStatus::InProgress {
            self.difficulty_used = difficulty_used;
        }
        self.last_accessed = self.last_accessed.max(now);
    }

    /// # Errors
    ///
    /// Returns `LessonProgressError::InvalidPercent` if `percent` is outside `0..=100`.
    pub fn record_progress(&mut self, percent: f64, now: DateTime<Utc>) -> Result<(), LessonProgressError> {
        validate_percent(percent)?;
        if self.status != LessonStatus::Completed {
            self.progress_percent = self.progress_percent.max(percent);
            self.status = LessonStatus::InProgress;
            self.started_at.get_or_insert(now);
        }
        self.last_accessed = self.last_accessed.max(now);
        Ok(())
    }

    /// Mark finished. Completing twice keeps the first completion time.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        if self.status != LessonStatus::Completed {
            self.status = LessonStatus::Completed;
            self.progress_percent = 100.0;
            self.completed_at = Some(now);
            self.started_at.get_or_insert(now);
        }
        self.last_accessed = self.last_accessed.max(now);
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn status(&self) -> LessonStatus {
        self.status
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == LessonStatus::Completed
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    #[must_use]
    pub fn difficulty_used(&self) -> DifficultyLevel {
        self.difficulty_used
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }
}

fn validate_percent(percent: f64) -> Result<(), LessonProgressError> {
    if percent.is_finite() && (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(LessonProgressError::InvalidPercent(percent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn started() -> LessonProgress {
        LessonProgress::start(
            StudentId::new(1),
            LessonId::new(9),
            DifficultyLevel::Easy,
            fixed_now(),
        )
    }

    #[test]
    fn start_marks_in_progress() {
        let lp = started();
        assert_eq!(lp.status(), LessonStatus::InProgress);
        assert_eq!(lp.started_at(), Some(fixed_now()));
        assert_eq!(lp.completed_at(), None);
    }

    #[test]
    fn completing_twice_keeps_first_time() {
        let mut lp = started();
        let first = fixed_now() + Duration::minutes(10);
        lp.complete(first);
        lp.complete(first + Duration::days(1));
        assert!(lp.is_completed());
        assert_eq!(lp.progress_percent(), 100.0);
        assert_eq!(lp.completed_at(), Some(first));
        assert_eq!(lp.last_accessed(), first + Duration::days(1));
    }

    #[test]
    fn reopen_does_not_downgrade_completion() {
        let mut lp = started();
        lp.complete(fixed_now());
        lp.reopen(DifficultyLevel::Advanced, fixed_now() + Duration::hours(1));
        assert!(lp.is_completed());
        assert_eq!(lp.difficulty_used(), DifficultyLevel::Easy);
    }

    #[test]
    fn progress_percent_is_validated_and_monotonic() {
        let mut lp = started();
        lp.record_progress(40.0, fixed_now()).unwrap();
        lp.record_progress(20.0, fixed_now()).unwrap();
        assert_eq!(lp.progress_percent(), 40.0);
        assert!(matches!(
            lp.record_progress(120.0, fixed_now()),
            Err(LessonProgressError::InvalidPercent(_))
        ));
    }

    #[test]
    fn persisted_completed_requires_timestamp() {
        let err = LessonProgress::from_persisted(
            StudentId::new(1),
            LessonId::new(1),
            LessonStatus::Completed,
            100.0,
            DifficultyLevel::Easy,
            None,
            None,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, LessonProgressError::MissingCompletedAt);
    }
}
