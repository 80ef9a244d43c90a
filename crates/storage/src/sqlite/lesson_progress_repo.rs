use chrono::{DateTime, Utc};
use tutor_core::model::{LessonId, LessonProgress, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_lesson_progress_row};
use crate::repository::{LessonProgressRepository, StorageError};

#[async_trait::async_trait]
impl LessonProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        student_id: StudentId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT student_id, lesson_id, status, progress_percent, difficulty_used,
                   started_at, completed_at, last_accessed
            FROM lesson_progress
            WHERE student_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(id_i64("student_id", student_id.value())?)
        .bind(id_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_lesson_progress_row).transpose()
    }

    async fn upsert_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_progress (
                student_id, lesson_id, status, progress_percent, difficulty_used,
                started_at, completed_at, last_accessed
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(student_id, lesson_id) DO UPDATE SET
                status = excluded.status,
                progress_percent = excluded.progress_percent,
                difficulty_used = excluded.difficulty_used,
                started_at = excluded.started_at,
                completed_at = excluded.completed_at,
                last_accessed = excluded.last_accessed
            ",
        )
        .bind(id_i64("student_id", progress.student_id().value())?)
        .bind(id_i64("lesson_id", progress.lesson_id().value())?)
        .bind(progress.status().as_str())
        .bind(progress.progress_percent())
        .bind(progress.difficulty_used().as_str())
        .bind(progress.started_at())
        .bind(progress.completed_at())
        .bind(progress.last_accessed())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            other => conn(other),
        })?;

        Ok(())
    }

    async fn progress_for_student(
        &self,
        student_id: StudentId,
        accessed_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT student_id, lesson_id, status, progress_percent, difficulty_used,
                   started_at, completed_at, last_accessed
            FROM lesson_progress
            WHERE student_id = ?1
              AND (?2 IS NULL OR last_accessed >= ?2)
            ORDER BY lesson_id ASC
            ",
        )
        .bind(id_i64("student_id", student_id.value())?)
        .bind(accessed_from)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_lesson_progress_row).collect()
    }
}
