//! Pure roll-ups of a student's stored records.
//!
//! Everything here is a function of the records passed in and a reference
//! instant, so results can be recomputed on every view instead of cached.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DifficultyLevel, LessonProgress, QuizResult};

mod lessons;
mod report;
mod streak;

pub use lessons::{LessonOverview, LessonRow, lesson_overview};
pub use report::{
    Achievement, DailyScore, Engagement, EngagementLevel, WeekdayActivity, WeeklyReport,
    daily_scores, difficulty_distribution, engagement, weekly_report,
};
pub use streak::{activity_days, current_streak};

//
// ─── TIME WINDOW ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeWindowError {
    #[error("unknown time window: {0} (expected week, month or all)")]
    Unknown(String),
}

/// Reporting window ending at "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[default]
    Week,
    Month,
    AllTime,
}

impl TimeWindow {
    #[must_use]
    pub fn days(self) -> Option<i64> {
        match self {
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::AllTime => None,
        }
    }

    /// Inclusive lower bound, or `None` for all time.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|d| now - Duration::days(d))
    }

    #[must_use]
    pub fn contains(self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        at <= now && self.start(now).is_none_or(|start| at >= start)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::AllTime => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = TimeWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "all" | "all_time" | "all-time" => Ok(Self::AllTime),
            _ => Err(TimeWindowError::Unknown(s.to_owned())),
        }
    }
}

//
// ─── RATINGS ───────────────────────────────────────────────────────────────────
//

/// Recent results compared with older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    /// Fewer than three results.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyRating {
    Excellent,
    Good,
    NeedsImprovement,
    Struggling,
}

impl AccuracyRating {
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        match average {
            a if a >= 80.0 => Self::Excellent,
            a if a >= 60.0 => Self::Good,
            a if a >= 40.0 => Self::NeedsImprovement,
            _ => Self::Struggling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedRating {
    Fast,
    Average,
    Slow,
}

impl SpeedRating {
    #[must_use]
    pub fn from_mean_secs(mean: f64) -> Self {
        match mean {
            m if m < 60.0 => Self::Fast,
            m if m < 180.0 => Self::Average,
            _ => Self::Slow,
        }
    }
}

const TREND_MARGIN: f64 = 5.0;
const TREND_RECENT: usize = 3;

/// Trend over results ordered oldest to newest.
#[must_use]
pub fn trend(scores: &[f64]) -> Trend {
    if scores.len() < TREND_RECENT {
        return Trend::Neutral;
    }
    let (older, recent) = scores.split_at(scores.len() - TREND_RECENT);
    let recent_avg = mean(recent).unwrap_or_default();
    let baseline = mean(older).or_else(|| mean(scores)).unwrap_or_default();

    if recent_avg > baseline + TREND_MARGIN {
        Trend::Improving
    } else if recent_avg < baseline - TREND_MARGIN {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

//
// ─── PERIOD SUMMARY ────────────────────────────────────────────────────────────
//

/// Derived statistics for one student over one window. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub window: TimeWindow,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: DateTime<Utc>,
    pub quizzes_taken: u32,
    /// `None` when no quiz was taken in the window. Rounded for display.
    pub average_score: Option<f64>,
    /// Unrounded mean, compared against the policy bands.
    #[serde(skip)]
    pub(crate) mean_score: Option<f64>,
    pub highest_score: Option<f64>,
    pub lowest_score: Option<f64>,
    pub total_time_secs: u64,
    pub lessons_completed: u32,
    pub lessons_accessed: u32,
    pub current_streak: u32,
    pub average_by_difficulty: BTreeMap<DifficultyLevel, f64>,
    pub trend: Trend,
    pub accuracy: Option<AccuracyRating>,
    pub speed: Option<SpeedRating>,
}

impl PeriodSummary {
    /// Any quiz taken or lesson touched within the window.
    #[must_use]
    pub fn has_activity(&self) -> bool {
        self.quizzes_taken > 0 || self.lessons_completed > 0 || self.lessons_accessed > 0
    }

    /// Exact mean score of the window, before display rounding.
    #[must_use]
    pub fn mean_score(&self) -> Option<f64> {
        self.mean_score
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Roll up a student's records for `window` ending at `now`.
///
/// Records outside the window are ignored, so callers may pass either a
/// pre-filtered slice or the full history.
#[must_use]
pub fn summarize(
    results: &[QuizResult],
    lessons: &[LessonProgress],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> PeriodSummary {
    let mut in_window: Vec<&QuizResult> = results
        .iter()
        .filter(|r| window.contains(r.completed_at, now))
        .collect();
    in_window.sort_by_key(|r| r.completed_at);

    let scores: Vec<f64> = in_window.iter().map(|r| r.score.value()).collect();

    let completed: Vec<&LessonProgress> = lessons
        .iter()
        .filter(|lp| {
            lp.completed_at()
                .is_some_and(|at| lp.is_completed() && window.contains(at, now))
        })
        .collect();
    let accessed = lessons
        .iter()
        .filter(|lp| window.contains(lp.last_accessed(), now))
        .count();

    let mut by_difficulty: BTreeMap<DifficultyLevel, Vec<f64>> = BTreeMap::new();
    for r in &in_window {
        by_difficulty
            .entry(r.difficulty_at_time)
            .or_default()
            .push(r.score.value());
    }
    let average_by_difficulty = by_difficulty
        .into_iter()
        .filter_map(|(level, s)| mean(&s).map(|m| (level, round1(m))))
        .collect();

    let timed: Vec<f64> = in_window
        .iter()
        .filter(|r| r.time_spent_secs > 0)
        .map(|r| f64::from(r.time_spent_secs))
        .collect();

    let average = mean(&scores);
    let days = streak::activity_days(
        in_window.iter().map(|r| r.completed_at),
        completed.iter().filter_map(|lp| lp.completed_at()),
    );

    PeriodSummary {
        window,
        period_start: window.start(now),
        period_end: now,
        quizzes_taken: saturating_u32(in_window.len()),
        average_score: average.map(round1),
        mean_score: average,
        highest_score: scores.iter().copied().reduce(f64::max),
        lowest_score: scores.iter().copied().reduce(f64::min),
        total_time_secs: in_window.iter().map(|r| u64::from(r.time_spent_secs)).sum(),
        lessons_completed: saturating_u32(completed.len()),
        lessons_accessed: saturating_u32(accessed),
        current_streak: streak::current_streak(&days),
        average_by_difficulty,
        trend: trend(&scores),
        accuracy: average.map(AccuracyRating::from_average),
        speed: mean(&timed).map(SpeedRating::from_mean_secs),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};

    use crate::model::{
        DifficultyLevel, LessonId, LessonProgress, QuizId, QuizResult, Score, StudentId,
    };

    pub fn result(score: f64, at: DateTime<Utc>, level: DifficultyLevel, secs: u32) -> QuizResult {
        QuizResult {
            student_id: StudentId::new(1),
            lesson_id: LessonId::new(1),
            quiz_id: QuizId::new(1),
            score: Score::new(score).unwrap(),
            correct_answers: None,
            total_questions: None,
            time_spent_secs: secs,
            difficulty_at_time: level,
            completed_at: at,
        }
    }

    pub fn completed_lesson(lesson: u64, at: DateTime<Utc>) -> LessonProgress {
        let mut lp =
            LessonProgress::start(StudentId::new(1), LessonId::new(lesson), DifficultyLevel::Easy, at);
        lp.complete(at);
        lp
    }
}
