use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use storage::repository::{
    LessonProgressRepository, QuizResultRepository, QuizSubmissionPersistence, StorageError,
    StudentRepository,
};
use tutor_core::model::{
    DifficultyLevel, LessonProgress, QuizResult, QuizSubmission, Score, StudentId,
};
use tutor_core::policy::{DifficultyPolicy, LevelTransition};
use tutor_core::progress::{PeriodSummary, TimeWindow, summarize};
use tutor_core::recommend::{Recommendation, recommend};

use crate::error::SubmissionError;
use crate::locks::StudentLocks;
use crate::{Clock, EngineSettings};

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Everything the presentation layer needs after a quiz is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub result_id: i64,
    pub result: QuizResult,
    pub transition: LevelTransition,
    /// Level after this submission.
    pub level: DifficultyLevel,
    pub feedback: &'static str,
    pub summary: PeriodSummary,
    pub recommendations: Vec<Recommendation>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Records quiz results and adapts the student's difficulty level.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    settings: EngineSettings,
    students: Arc<dyn StudentRepository>,
    results: Arc<dyn QuizResultRepository>,
    submissions: Arc<dyn QuizSubmissionPersistence>,
    lessons: Arc<dyn LessonProgressRepository>,
    locks: StudentLocks,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        students: Arc<dyn StudentRepository>,
        results: Arc<dyn QuizResultRepository>,
        submissions: Arc<dyn QuizSubmissionPersistence>,
        lessons: Arc<dyn LessonProgressRepository>,
    ) -> Self {
        Self {
            clock,
            settings: EngineSettings::default(),
            students,
            results,
            submissions,
            lessons,
            locks: StudentLocks::new(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Validate, evaluate and persist one quiz submission.
    ///
    /// The score is checked before storage is touched. All reads happen before
    /// the result append and the level change, which are written in one
    /// atomic step while holding the student's lock. A returned error means
    /// nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::InvalidScore` for out-of-range scores,
    /// `SubmissionError::UnknownStudent` if the student does not exist, and
    /// `SubmissionError::Storage` if persistence fails (including a
    /// `StorageError::Conflict` when another writer moved the level first).
    pub async fn submit(
        &self,
        submission: QuizSubmission,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let validated = submission.validate()?;
        let student_id = validated.student_id;

        let _guard = self.locks.acquire(student_id).await;

        let student = self
            .students
            .get_student(student_id)
            .await?
            .ok_or(SubmissionError::UnknownStudent(student_id))?;
        let current = student.level();

        let policy = DifficultyPolicy::new(self.settings.policy());
        let mut scores = self
            .prior_scores(student_id, policy.settings().window())
            .await?;
        scores.push(validated.score);
        let transition = policy.evaluate(current, &scores);

        let now = self.clock.now();
        let result = validated.into_result(current, now);

        let window = self.settings.summary_window();
        let (mut history, lessons) = self.history(student_id, window, now).await?;

        let result_id = self
            .submissions
            .record_quiz_result(&result, &transition)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => SubmissionError::UnknownStudent(student_id),
                StorageError::Conflict => {
                    tracing::warn!(%student_id, expected = %current, "level changed by another writer");
                    SubmissionError::Storage(StorageError::Conflict)
                }
                other => SubmissionError::Storage(other),
            })?;

        if transition.changed() {
            tracing::info!(
                %student_id,
                from = %transition.from(),
                to = %transition.to(),
                reason = transition.reason(),
                "difficulty level changed"
            );
        } else {
            tracing::debug!(%student_id, level = %current, reason = transition.reason(), "level kept");
        }

        history.push(result.clone());
        let summary = summarize(&history, &lessons, window, now);
        tracing::debug!(
            %student_id,
            window = %window,
            quizzes = summary.quizzes_taken,
            average = ?summary.average_score,
            "summary computed"
        );
        let recommendations = recommend(&summary, transition.to());

        Ok(SubmissionOutcome {
            result_id,
            feedback: result.score.feedback(),
            level: transition.to(),
            result,
            transition,
            summary,
            recommendations,
        })
    }

    /// Scores preceding the new one that the policy window can still see.
    async fn prior_scores(
        &self,
        student_id: StudentId,
        window: usize,
    ) -> Result<Vec<Score>, StorageError> {
        let wanted = window.saturating_sub(1);
        if wanted == 0 {
            return Ok(Vec::new());
        }
        let limit = u32::try_from(wanted).unwrap_or(u32::MAX);
        let rows = self.results.recent_results(student_id, limit).await?;
        Ok(rows.into_iter().map(|row| row.result.score).collect())
    }

    /// Window history read before the write, so nothing after the commit can fail.
    async fn history(
        &self,
        student_id: StudentId,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<(Vec<QuizResult>, Vec<LessonProgress>), StorageError> {
        let from = window.start(now);
        let results = self
            .results
            .results_for_student(student_id, from, Some(now))
            .await?
            .into_iter()
            .map(|row| row.result)
            .collect();
        let lessons = self.lessons.progress_for_student(student_id, from).await?;
        Ok((results, lessons))
    }
}
