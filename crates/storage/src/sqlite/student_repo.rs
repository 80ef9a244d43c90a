use chrono::{DateTime, Utc};
use tutor_core::model::{AccessibilityPreferences, NewStudent, Student, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, flag, id_i64, map_student_row};
use crate::repository::{StorageError, StudentRepository};

const STUDENT_COLUMNS: &str = "id, display_name, difficulty, preferred_mode, audio_enabled, \
     sign_language_enabled, emotion_detection_enabled, font_size, high_contrast, reduce_motion, \
     created_at, last_active";

#[async_trait::async_trait]
impl StudentRepository for SqliteRepository {
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StorageError> {
        let prefs = student.accessibility();
        let res = sqlx::query(
            r"
            INSERT INTO students (
                display_name, difficulty, preferred_mode, audio_enabled, sign_language_enabled,
                emotion_detection_enabled, font_size, high_contrast, reduce_motion,
                created_at, last_active
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ",
        )
        .bind(student.display_name())
        .bind(student.initial_level().as_str())
        .bind(prefs.preferred_mode().as_str())
        .bind(flag(prefs.audio_enabled()))
        .bind(flag(prefs.sign_language_enabled()))
        .bind(flag(prefs.emotion_detection_enabled()))
        .bind(i64::from(prefs.font_size()))
        .bind(flag(prefs.high_contrast()))
        .bind(flag(prefs.reduce_motion()))
        .bind(student.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("student_id sign overflow".into()))?;
        Ok(student.clone().assign_id(StudentId::new(id)))
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let row = sqlx::query(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"))
            .bind(id_i64("student_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_student_row).transpose()
    }

    async fn list_students(&self, limit: u32) -> Result<Vec<Student>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY id ASC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_student_row).collect()
    }

    async fn update_accessibility(
        &self,
        id: StudentId,
        prefs: &AccessibilityPreferences,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE students SET
                preferred_mode = ?2,
                audio_enabled = ?3,
                sign_language_enabled = ?4,
                emotion_detection_enabled = ?5,
                font_size = ?6,
                high_contrast = ?7,
                reduce_motion = ?8
            WHERE id = ?1
            ",
        )
        .bind(id_i64("student_id", id.value())?)
        .bind(prefs.preferred_mode().as_str())
        .bind(flag(prefs.audio_enabled()))
        .bind(flag(prefs.sign_language_enabled()))
        .bind(flag(prefs.emotion_detection_enabled()))
        .bind(i64::from(prefs.font_size()))
        .bind(flag(prefs.high_contrast()))
        .bind(flag(prefs.reduce_motion()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn touch_student(&self, id: StudentId, at: DateTime<Utc>) -> Result<(), StorageError> {
        let student_id = id_i64("student_id", id.value())?;
        let res = sqlx::query(
            r"
            UPDATE students
            SET last_active = CASE WHEN last_active < ?2 THEN ?2 ELSE last_active END
            WHERE id = ?1
            ",
        )
        .bind(student_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
