use thiserror::Error;

use crate::model::{
    AccessibilityError, DifficultyError, LessonProgressError, ScoreError, StudentError,
};
use crate::policy::PolicyError;
use crate::progress::TimeWindowError;

/// Umbrella for every domain validation failure in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Accessibility(#[from] AccessibilityError),
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    LessonProgress(#[from] LessonProgressError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    TimeWindow(#[from] TimeWindowError),
}
