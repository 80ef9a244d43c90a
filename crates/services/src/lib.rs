#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod lesson_service;
pub mod locks;
pub mod progress_service;
pub mod quiz_service;
pub mod student_service;

pub use tutor_core::{Clock, EngineSettings};

pub use app_services::AppServices;
pub use error::{
    AppServicesError, LessonServiceError, ProgressError, StudentServiceError, SubmissionError,
};
pub use lesson_service::LessonService;
pub use locks::StudentLocks;
pub use progress_service::{ProgressReport, ProgressService};
pub use quiz_service::{QuizService, SubmissionOutcome};
pub use student_service::StudentService;
