use std::sync::Arc;

use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::lesson_service::LessonService;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::student_service::StudentService;
use crate::{Clock, EngineSettings};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    settings: EngineSettings,
    students: Arc<StudentService>,
    quizzes: Arc<QuizService>,
    lessons: Arc<LessonService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: EngineSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over the given repositories.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: EngineSettings) -> Self {
        let students = Arc::new(StudentService::new(clock, Arc::clone(&storage.students)));
        let quizzes = Arc::new(
            QuizService::new(
                clock,
                Arc::clone(&storage.students),
                Arc::clone(&storage.quiz_results),
                Arc::clone(&storage.submissions),
                Arc::clone(&storage.lessons),
            )
            .with_settings(settings),
        );
        let lessons = Arc::new(LessonService::new(
            clock,
            Arc::clone(&storage.students),
            Arc::clone(&storage.lessons),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.students),
            Arc::clone(&storage.quiz_results),
            Arc::clone(&storage.lessons),
        ));

        Self {
            settings,
            students,
            quizzes,
            lessons,
            progress,
        }
    }

    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    #[must_use]
    pub fn students(&self) -> Arc<StudentService> {
        Arc::clone(&self.students)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}
