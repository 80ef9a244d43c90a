use chrono::{DateTime, Utc};
use tutor_core::model::{QuizResult, StudentId};
use tutor_core::policy::LevelTransition;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_quiz_result_row};
use crate::repository::{
    QuizResultRepository, QuizResultRow, QuizSubmissionPersistence, StorageError,
};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn results_for_student(
        &self,
        student_id: StudentId,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, student_id, lesson_id, quiz_id, score, correct_answers, total_questions,
                   time_spent_secs, difficulty_at_time, completed_at
            FROM quiz_results
            WHERE student_id = ?1
              AND (?2 IS NULL OR completed_at >= ?2)
              AND (?3 IS NULL OR completed_at <= ?3)
            ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(id_i64("student_id", student_id.value())?)
        .bind(completed_from)
        .bind(completed_until)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_quiz_result_row).collect()
    }

    async fn recent_results(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, student_id, lesson_id, quiz_id, score, correct_answers, total_questions,
                   time_spent_secs, difficulty_at_time, completed_at
            FROM quiz_results
            WHERE student_id = ?1
            ORDER BY completed_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(id_i64("student_id", student_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = rows
            .iter()
            .map(map_quiz_result_row)
            .collect::<Result<Vec<_>, _>>()?;
        out.reverse();
        Ok(out)
    }
}

#[async_trait::async_trait]
impl QuizSubmissionPersistence for SqliteRepository {
    async fn record_quiz_result(
        &self,
        result: &QuizResult,
        transition: &LevelTransition,
    ) -> Result<i64, StorageError> {
        if result.difficulty_at_time != transition.from() {
            return Err(StorageError::Conflict);
        }

        let student_id = id_i64("student_id", result.student_id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Compare-and-set on the level: only the writer that saw the current level wins.
        let updated = sqlx::query(
            r"
            UPDATE students
            SET difficulty = ?2,
                last_active = CASE WHEN last_active < ?4 THEN ?4 ELSE last_active END
            WHERE id = ?1 AND difficulty = ?3
            ",
        )
        .bind(student_id)
        .bind(transition.to().as_str())
        .bind(transition.from().as_str())
        .bind(result.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM students WHERE id = ?1")
                .bind(student_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(conn)?;
            return Err(if exists.is_some() {
                StorageError::Conflict
            } else {
                StorageError::NotFound
            });
        }

        let res = sqlx::query(
            r"
            INSERT INTO quiz_results (
                student_id, lesson_id, quiz_id, score, correct_answers, total_questions,
                time_spent_secs, difficulty_at_time, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(student_id)
        .bind(id_i64("lesson_id", result.lesson_id.value())?)
        .bind(id_i64("quiz_id", result.quiz_id.value())?)
        .bind(result.score.value())
        .bind(result.correct_answers.map(i64::from))
        .bind(result.total_questions.map(i64::from))
        .bind(i64::from(result.time_spent_secs))
        .bind(result.difficulty_at_time.as_str())
        .bind(result.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        Ok(res.last_insert_rowid())
    }
}
