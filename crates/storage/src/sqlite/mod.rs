use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use thiserror::Error;

use crate::repository::{
    LessonProgressRepository, QuizResultRepository, QuizSubmissionPersistence, Storage,
    StudentRepository,
};

mod lesson_progress_repo;
mod mapping;
mod migrate;
mod quiz_result_repo;
mod student_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("invalid database url: {0}")]
    InvalidUrl(#[source] sqlx::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Pool tuning. Writes are short per-student transactions, so a small pool
/// and a busy timeout longer than any one submission are enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(15),
        }
    }
}

impl SqliteRepository {
    /// Connect with [`PoolSettings::default`].
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed or the pool cannot
    /// be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with(database_url, PoolSettings::default()).await
    }

    /// Connect with foreign keys enforced and the WAL journal, which lets
    /// report reads run alongside a submission write.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed or the pool cannot
    /// be opened.
    pub async fn connect_with(
        database_url: &str,
        settings: PoolSettings,
    ) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(SqliteInitError::InvalidUrl)?
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(settings.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;
        tracing::debug!(database_url, max_connections = settings.max_connections, "sqlite pool ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let students: Arc<dyn StudentRepository> = Arc::new(repo.clone());
        let quiz_results: Arc<dyn QuizResultRepository> = Arc::new(repo.clone());
        let submissions: Arc<dyn QuizSubmissionPersistence> = Arc::new(repo.clone());
        let lessons: Arc<dyn LessonProgressRepository> = Arc::new(repo);
        Ok(Self {
            students,
            quiz_results,
            submissions,
            lessons,
        })
    }
}
