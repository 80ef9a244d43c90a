use std::sync::Arc;

use storage::repository::{StorageError, StudentRepository};
use tutor_core::model::{AccessibilityPreferences, NewStudent, Student, StudentId};

use crate::Clock;
use crate::error::StudentServiceError;

/// Registration and preference management for students.
#[derive(Clone)]
pub struct StudentService {
    clock: Clock,
    students: Arc<dyn StudentRepository>,
}

impl StudentService {
    #[must_use]
    pub fn new(clock: Clock, students: Arc<dyn StudentRepository>) -> Self {
        Self { clock, students }
    }

    /// Register a student at the initial difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::Student` for an invalid display name.
    /// Returns `StudentServiceError::Storage` if persistence fails.
    pub async fn register(
        &self,
        display_name: &str,
        accessibility: AccessibilityPreferences,
    ) -> Result<Student, StudentServiceError> {
        let new = NewStudent::new(display_name, accessibility, self.clock.now())?;
        let student = self.students.insert_student(&new).await?;
        tracing::info!(student_id = %student.id(), level = %student.level(), "student registered");
        Ok(student)
    }

    /// Fetch a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::UnknownStudent` if no such student exists.
    pub async fn get(&self, id: StudentId) -> Result<Student, StudentServiceError> {
        self.students
            .get_student(id)
            .await?
            .ok_or(StudentServiceError::UnknownStudent(id))
    }

    /// # Errors
    ///
    /// Returns `StudentServiceError::Storage` if repository access fails.
    pub async fn list(&self, limit: u32) -> Result<Vec<Student>, StudentServiceError> {
        Ok(self.students.list_students(limit).await?)
    }

    /// Replace accessibility preferences. The difficulty level is untouched.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::UnknownStudent` if no such student exists.
    pub async fn update_preferences(
        &self,
        id: StudentId,
        accessibility: AccessibilityPreferences,
    ) -> Result<Student, StudentServiceError> {
        match self.students.update_accessibility(id, &accessibility).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(StudentServiceError::UnknownStudent(id)),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(student_id = %id, mode = %accessibility.preferred_mode(), "preferences updated");
        self.get(id).await
    }
}
