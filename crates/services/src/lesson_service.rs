use std::sync::Arc;

use storage::repository::{LessonProgressRepository, StorageError, StudentRepository};
use tutor_core::model::{LessonId, LessonProgress, Student, StudentId};

use crate::Clock;
use crate::error::LessonServiceError;

/// Tracks lesson access and completion. Never changes the difficulty level.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    students: Arc<dyn StudentRepository>,
    lessons: Arc<dyn LessonProgressRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        students: Arc<dyn StudentRepository>,
        lessons: Arc<dyn LessonProgressRepository>,
    ) -> Self {
        Self {
            clock,
            students,
            lessons,
        }
    }

    /// Open a lesson at the student's current level.
    ///
    /// The returned progress carries the level the content should be served at.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::UnknownStudent` if no such student exists.
    /// Returns `LessonServiceError::Storage` if persistence fails.
    pub async fn open_lesson(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
    ) -> Result<LessonProgress, LessonServiceError> {
        let student = self.student(student_id).await?;
        let now = self.clock.now();
        let progress = match self.lessons.get_progress(student_id, lesson_id).await? {
            Some(mut existing) => {
                existing.reopen(student.level(), now);
                existing
            }
            None => LessonProgress::start(student_id, lesson_id, student.level(), now),
        };
        self.save(&progress).await?;
        tracing::debug!(%student_id, %lesson_id, level = %progress.difficulty_used(), "lesson opened");
        Ok(progress)
    }

    /// Record partial progress. Progress never moves backwards.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Progress` for a percent outside `0..=100`.
    pub async fn record_progress(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
        percent: f64,
    ) -> Result<LessonProgress, LessonServiceError> {
        let mut progress = self.current_or_start(student_id, lesson_id).await?;
        progress.record_progress(percent, self.clock.now())?;
        self.save(&progress).await?;
        Ok(progress)
    }

    /// Mark a lesson as completed. Completing twice keeps the first completion time.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::UnknownStudent` if no such student exists.
    pub async fn complete_lesson(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
    ) -> Result<LessonProgress, LessonServiceError> {
        let mut progress = self.current_or_start(student_id, lesson_id).await?;
        progress.complete(self.clock.now());
        self.save(&progress).await?;
        tracing::info!(%student_id, %lesson_id, "lesson completed");
        Ok(progress)
    }

    async fn student(&self, student_id: StudentId) -> Result<Student, LessonServiceError> {
        self.students
            .get_student(student_id)
            .await?
            .ok_or(LessonServiceError::UnknownStudent(student_id))
    }

    async fn current_or_start(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
    ) -> Result<LessonProgress, LessonServiceError> {
        let student = self.student(student_id).await?;
        Ok(self
            .lessons
            .get_progress(student_id, lesson_id)
            .await?
            .unwrap_or_else(|| {
                LessonProgress::start(student_id, lesson_id, student.level(), self.clock.now())
            }))
    }

    async fn save(&self, progress: &LessonProgress) -> Result<(), LessonServiceError> {
        let student_id = progress.student_id();
        let touched = async {
            self.lessons.upsert_progress(progress).await?;
            self.students
                .touch_student(student_id, progress.last_accessed())
                .await
        };
        touched.await.map_err(|e| match e {
            StorageError::NotFound => LessonServiceError::UnknownStudent(student_id),
            other => other.into(),
        })
    }
}
