use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tutor_core::model::{
    AccessibilityPreferences, ContentMode, DifficultyLevel, LessonId, LessonProgress,
    LessonStatus, QuizId, QuizResult, Score, Student, StudentId,
};

use crate::repository::{QuizResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn flag(v: bool) -> i64 {
    i64::from(v)
}

fn level_from_row(row: &SqliteRow, column: &str) -> Result<DifficultyLevel, StorageError> {
    row.try_get::<String, _>(column)
        .map_err(ser)?
        .parse::<DifficultyLevel>()
        .map_err(ser)
}

pub(crate) fn map_student_row(row: &SqliteRow) -> Result<Student, StorageError> {
    let mode = row
        .try_get::<String, _>("preferred_mode")
        .map_err(ser)?
        .parse::<ContentMode>()
        .map_err(ser)?;
    let font_size = u8::try_from(row.try_get::<i64, _>("font_size").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("font_size overflow".into()))?;

    let accessibility = AccessibilityPreferences::new(
        mode,
        row.try_get::<i64, _>("audio_enabled").map_err(ser)? != 0,
        row.try_get::<i64, _>("sign_language_enabled").map_err(ser)? != 0,
        row.try_get::<i64, _>("emotion_detection_enabled").map_err(ser)? != 0,
        font_size,
        row.try_get::<i64, _>("high_contrast").map_err(ser)? != 0,
        row.try_get::<i64, _>("reduce_motion").map_err(ser)? != 0,
    )
    .map_err(ser)?;

    Student::from_persisted(
        StudentId::new(i64_to_u64("student_id", row.try_get("id").map_err(ser)?)?),
        row.try_get::<String, _>("display_name").map_err(ser)?,
        level_from_row(row, "difficulty")?,
        accessibility,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("last_active").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_quiz_result_row(row: &SqliteRow) -> Result<QuizResultRow, StorageError> {
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let correct_answers = row
        .try_get::<Option<i64>, _>("correct_answers")
        .map_err(ser)?
        .map(|v| i64_to_u32("correct_answers", v))
        .transpose()?;
    let total_questions = row
        .try_get::<Option<i64>, _>("total_questions")
        .map_err(ser)?
        .map(|v| i64_to_u32("total_questions", v))
        .transpose()?;

    let result = QuizResult {
        student_id: StudentId::new(i64_to_u64(
            "student_id",
            row.try_get("student_id").map_err(ser)?,
        )?),
        lesson_id: LessonId::new(i64_to_u64("lesson_id", row.try_get("lesson_id").map_err(ser)?)?),
        quiz_id: QuizId::new(i64_to_u64("quiz_id", row.try_get("quiz_id").map_err(ser)?)?),
        score: Score::new(row.try_get("score").map_err(ser)?).map_err(ser)?,
        correct_answers,
        total_questions,
        time_spent_secs: i64_to_u32(
            "time_spent_secs",
            row.try_get("time_spent_secs").map_err(ser)?,
        )?,
        difficulty_at_time: level_from_row(row, "difficulty_at_time")?,
        completed_at,
    };

    Ok(QuizResultRow::new(row.try_get("id").map_err(ser)?, result))
}

pub(crate) fn map_lesson_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    let status = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse::<LessonStatus>()
        .map_err(ser)?;

    LessonProgress::from_persisted(
        StudentId::new(i64_to_u64("student_id", row.try_get("student_id").map_err(ser)?)?),
        LessonId::new(i64_to_u64("lesson_id", row.try_get("lesson_id").map_err(ser)?)?),
        status,
        row.try_get("progress_percent").map_err(ser)?,
        level_from_row(row, "difficulty_used")?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        row.try_get("last_accessed").map_err(ser)?,
    )
    .map_err(ser)
}
