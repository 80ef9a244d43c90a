use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates students, the append-only quiz history, lesson progress, and indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY,
                    display_name TEXT NOT NULL,
                    difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'advanced')),
                    preferred_mode TEXT NOT NULL,
                    audio_enabled INTEGER NOT NULL,
                    sign_language_enabled INTEGER NOT NULL,
                    emotion_detection_enabled INTEGER NOT NULL,
                    font_size INTEGER NOT NULL CHECK (font_size BETWEEN 12 AND 32),
                    high_contrast INTEGER NOT NULL,
                    reduce_motion INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    last_active TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_results (
                    id INTEGER PRIMARY KEY,
                    student_id INTEGER NOT NULL,
                    lesson_id INTEGER NOT NULL,
                    quiz_id INTEGER NOT NULL,
                    score REAL NOT NULL CHECK (score >= 0 AND score <= 100),
                    correct_answers INTEGER CHECK (correct_answers >= 0),
                    total_questions INTEGER CHECK (total_questions >= 0),
                    time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
                    difficulty_at_time TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lesson_progress (
                    student_id INTEGER NOT NULL,
                    lesson_id INTEGER NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('not_started', 'in_progress', 'completed')),
                    progress_percent REAL NOT NULL CHECK (progress_percent >= 0 AND progress_percent <= 100),
                    difficulty_used TEXT NOT NULL,
                    started_at TEXT,
                    completed_at TEXT,
                    last_accessed TEXT NOT NULL,
                    PRIMARY KEY (student_id, lesson_id),
                    FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_quiz_results_student_completed
                    ON quiz_results (student_id, completed_at, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_lesson_progress_student_accessed
                    ON lesson_progress (student_id, last_accessed);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
