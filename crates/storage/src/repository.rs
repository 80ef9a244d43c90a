use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tutor_core::model::{
    AccessibilityPreferences, LessonId, LessonProgress, NewStudent, QuizResult, Student,
    StudentId,
};
use tutor_core::policy::LevelTransition;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored quiz result together with its row id.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResultRow {
    pub id: i64,
    pub result: QuizResult,
}

impl QuizResultRow {
    #[must_use]
    pub fn new(id: i64, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// Repository contract for student accounts.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Create a student at the initial level and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the student cannot be stored.
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StorageError>;

    /// Fetch a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing student is `Ok(None)`.
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError>;

    /// List students ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_students(&self, limit: u32) -> Result<Vec<Student>, StorageError>;

    /// Replace a student's accessibility preferences. Never touches the level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist.
    async fn update_accessibility(
        &self,
        id: StudentId,
        prefs: &AccessibilityPreferences,
    ) -> Result<(), StorageError>;

    /// Bump `last_active` if `at` is later than the stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist.
    async fn touch_student(&self, id: StudentId, at: DateTime<Utc>) -> Result<(), StorageError>;
}

/// Read access to the append-only quiz history.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Results for a student ordered by completion time (oldest first),
    /// optionally bounded by an inclusive time range.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn results_for_student(
        &self,
        student_id: StudentId,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizResultRow>, StorageError>;

    /// The `limit` most recent results, returned oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn recent_results(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError>;
}

/// Single-writer persistence for quiz submissions.
#[async_trait]
pub trait QuizSubmissionPersistence: Send + Sync {
    /// Append `result` and move the student's level to `transition.to()` atomically.
    ///
    /// The write only happens if the stored level still equals `transition.from()`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student is missing and
    /// `StorageError::Conflict` if the stored level moved underneath the caller.
    async fn record_quiz_result(
        &self,
        result: &QuizResult,
        transition: &LevelTransition,
    ) -> Result<i64, StorageError>;
}

/// Repository contract for lesson progress.
#[async_trait]
pub trait LessonProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// Insert or replace the progress row for `(student, lesson)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist.
    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;

    /// All progress rows for a student, optionally only those accessed since `accessed_from`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn progress_for_student(
        &self,
        student_id: StudentId,
        accessed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<LessonProgress>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    next_student_id: u64,
    students: HashMap<StudentId, Student>,
    results: Vec<QuizResultRow>,
    lessons: HashMap<(StudentId, LessonId), LessonProgress>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All maps sit behind one lock so a submission is applied atomically.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StorageError> {
        let mut guard = self.lock()?;
        guard.next_student_id += 1;
        let stored = student.clone().assign_id(StudentId::new(guard.next_student_id));
        guard.students.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        Ok(self.lock()?.students.get(&id).cloned())
    }

    async fn list_students(&self, limit: u32) -> Result<Vec<Student>, StorageError> {
        let guard = self.lock()?;
        let mut students: Vec<Student> = guard.students.values().cloned().collect();
        students.sort_by_key(Student::id);
        students.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(students)
    }

    async fn update_accessibility(
        &self,
        id: StudentId,
        prefs: &AccessibilityPreferences,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let student = guard.students.get_mut(&id).ok_or(StorageError::NotFound)?;
        student.set_accessibility(prefs.clone());
        Ok(())
    }

    async fn touch_student(&self, id: StudentId, at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let student = guard.students.get_mut(&id).ok_or(StorageError::NotFound)?;
        student.touch(at);
        Ok(())
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn results_for_student(
        &self,
        student_id: StudentId,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<QuizResultRow> = guard
            .results
            .iter()
            .filter(|row| row.result.student_id == student_id)
            .filter(|row| completed_from.is_none_or(|from| row.result.completed_at >= from))
            .filter(|row| completed_until.is_none_or(|until| row.result.completed_at <= until))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.result.completed_at, row.id));
        Ok(rows)
    }

    async fn recent_results(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let mut rows = self.results_for_student(student_id, None, None).await?;
        let keep = usize::try_from(limit).unwrap_or(usize::MAX);
        let skip = rows.len().saturating_sub(keep);
        rows.drain(..skip);
        Ok(rows)
    }
}

#[async_trait]
impl QuizSubmissionPersistence for InMemoryRepository {
    async fn record_quiz_result(
        &self,
        result: &QuizResult,
        transition: &LevelTransition,
    ) -> Result<i64, StorageError> {
        if result.difficulty_at_time != transition.from() {
            return Err(StorageError::Conflict);
        }

        let mut guard = self.lock()?;
        let student = guard
            .students
            .get_mut(&result.student_id)
            .ok_or(StorageError::NotFound)?;
        student
            .apply_transition(transition)
            .map_err(|_| StorageError::Conflict)?;
        student.touch(result.completed_at);

        let id = i64::try_from(guard.results.len())
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?
            + 1;
        guard.results.push(QuizResultRow::new(id, result.clone()));
        Ok(id)
    }
}

#[async_trait]
impl LessonProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        Ok(self.lock()?.lessons.get(&(student_id, lesson_id)).cloned())
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.students.contains_key(&progress.student_id()) {
            return Err(StorageError::NotFound);
        }
        guard.lessons.insert(
            (progress.student_id(), progress.lesson_id()),
            progress.clone(),
        );
        Ok(())
    }

    async fn progress_for_student(
        &self,
        student_id: StudentId,
        accessed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let guard = self.lock()?;
        let mut rows: Vec<LessonProgress> = guard
            .lessons
            .values()
            .filter(|lp| lp.student_id() == student_id)
            .filter(|lp| accessed_from.is_none_or(|from| lp.last_accessed() >= from))
            .cloned()
            .collect();
        rows.sort_by_key(LessonProgress::lesson_id);
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub students: Arc<dyn StudentRepository>,
    pub quiz_results: Arc<dyn QuizResultRepository>,
    pub submissions: Arc<dyn QuizSubmissionPersistence>,
    pub lessons: Arc<dyn LessonProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            students: Arc::new(repo.clone()),
            quiz_results: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            lessons: Arc::new(repo),
        }
    }
}
