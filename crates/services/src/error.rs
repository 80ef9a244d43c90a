//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::model::{LessonProgressError, ScoreError, StudentError, StudentId};

/// Errors emitted by `QuizService::submit`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    /// Rejected before any storage access; nothing was written.
    #[error("invalid score: {0}")]
    InvalidScore(#[from] ScoreError),
    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudentServiceError {
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error(transparent)]
    Progress(#[from] LessonProgressError),
    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
