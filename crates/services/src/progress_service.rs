use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use storage::repository::{LessonProgressRepository, QuizResultRepository, StudentRepository};
use tutor_core::model::{
    DifficultyLevel, LessonId, LessonProgress, QuizResult, Student, StudentId,
};
use tutor_core::progress::{
    DailyScore, LessonOverview, PeriodSummary, TimeWindow, WeeklyReport, daily_scores,
    difficulty_distribution, lesson_overview, summarize, weekly_report,
};
use tutor_core::recommend::{Recommendation, recommend};

use crate::Clock;
use crate::error::ProgressError;

/// Days covered by the score series in a progress report.
pub const REPORT_SERIES_DAYS: u32 = 7;

/// Dashboard view of one student over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub student: Student,
    pub summary: PeriodSummary,
    pub recommendations: Vec<Recommendation>,
    pub daily_scores: Vec<DailyScore>,
    pub difficulty_distribution: BTreeMap<DifficultyLevel, u32>,
}

/// Read-only aggregation over a student's stored history.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    students: Arc<dyn StudentRepository>,
    results: Arc<dyn QuizResultRepository>,
    lessons: Arc<dyn LessonProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        students: Arc<dyn StudentRepository>,
        results: Arc<dyn QuizResultRepository>,
        lessons: Arc<dyn LessonProgressRepository>,
    ) -> Self {
        Self {
            clock,
            students,
            results,
            lessons,
        }
    }

    /// Summary for `window` ending now. An empty history yields the "no data" summary.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStudent` if no such student exists.
    pub async fn period_summary(
        &self,
        student_id: StudentId,
        window: TimeWindow,
    ) -> Result<PeriodSummary, ProgressError> {
        self.student(student_id).await?;
        let now = self.clock.now();
        let (results, lessons) = self.history(student_id, window, now).await?;
        Ok(summarize(&results, &lessons, window, now))
    }

    /// Advice for `window` at the student's current level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStudent` if no such student exists.
    pub async fn recommendations(
        &self,
        student_id: StudentId,
        window: TimeWindow,
    ) -> Result<Vec<Recommendation>, ProgressError> {
        let student = self.student(student_id).await?;
        let summary = self.period_summary(student_id, window).await?;
        Ok(recommend(&summary, student.level()))
    }

    /// Summary, advice, last-week score series and level distribution in one call.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStudent` if no such student exists.
    pub async fn report(
        &self,
        student_id: StudentId,
        window: TimeWindow,
    ) -> Result<ProgressReport, ProgressError> {
        let student = self.student(student_id).await?;
        let now = self.clock.now();
        let (results, lessons) = self.history(student_id, TimeWindow::AllTime, now).await?;

        let summary = summarize(&results, &lessons, window, now);
        let recommendations = recommend(&summary, student.level());
        tracing::debug!(%student_id, window = %window, items = recommendations.len(), "report built");

        Ok(ProgressReport {
            daily_scores: daily_scores(&results, REPORT_SERIES_DAYS, now),
            difficulty_distribution: difficulty_distribution(&results, window, now),
            student,
            summary,
            recommendations,
        })
    }

    /// Last-seven-days report with engagement and achievements.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStudent` if no such student exists.
    pub async fn weekly_report(&self, student_id: StudentId) -> Result<WeeklyReport, ProgressError> {
        let student = self.student(student_id).await?;
        let now = self.clock.now();
        let (results, lessons) = self.history(student_id, TimeWindow::AllTime, now).await?;
        Ok(weekly_report(&results, &lessons, student.level(), now))
    }

    /// Completion breakdown of `catalog` for one student.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStudent` if no such student exists.
    pub async fn lesson_overview(
        &self,
        student_id: StudentId,
        catalog: &[LessonId],
    ) -> Result<LessonOverview, ProgressError> {
        self.student(student_id).await?;
        let lessons = self.lessons.progress_for_student(student_id, None).await?;
        Ok(lesson_overview(catalog, &lessons))
    }

    /// Per-day mean scores for the last `days` days, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStudent` if no such student exists.
    pub async fn daily_scores(
        &self,
        student_id: StudentId,
        days: u32,
    ) -> Result<Vec<DailyScore>, ProgressError> {
        self.student(student_id).await?;
        let now = self.clock.now();
        let results = self
            .results
            .results_for_student(student_id, None, Some(now))
            .await?;
        let results: Vec<QuizResult> = results.into_iter().map(|row| row.result).collect();
        Ok(daily_scores(&results, days, now))
    }

    async fn student(&self, student_id: StudentId) -> Result<Student, ProgressError> {
        self.students
            .get_student(student_id)
            .await?
            .ok_or(ProgressError::UnknownStudent(student_id))
    }

    async fn history(
        &self,
        student_id: StudentId,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<(Vec<QuizResult>, Vec<LessonProgress>), ProgressError> {
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
