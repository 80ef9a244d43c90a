use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::model::{DifficultyLevel, LessonProgress, QuizResult};

use super::{PeriodSummary, TimeWindow, round1, summarize};

//
// ─── DAILY SERIES ──────────────────────────────────────────────────────────────
//

/// Mean score for one calendar day; `None` when no quiz was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub average: Option<f64>,
    pub quizzes: u32,
}

/// One entry per day for the last `days` days, oldest first, ending on `now`'s date.
#[must_use]
pub fn daily_scores(results: &[QuizResult], days: u32, now: DateTime<Utc>) -> Vec<DailyScore> {
    let today = now.date_naive();
    let mut per_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for r in results.iter().filter(|r| r.completed_at <= now) {
        per_day
            .entry(r.completed_at.date_naive())
            .or_default()
            .push(r.score.value());
    }

    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            let scores = per_day.get(&date).map(Vec::as_slice).unwrap_or_default();
            #[allow(clippy::cast_precision_loss)]
            let average = (!scores.is_empty())
                .then(|| round1(scores.iter().sum::<f64>() / scores.len() as f64));
            DailyScore {
                date,
                average,
                quizzes: u32::try_from(scores.len()).unwrap_or(u32::MAX),
            }
        })
        .collect()
}

/// Quizzes per difficulty-at-time level, limited to `window`.
#[must_use]
pub fn difficulty_distribution(
    results: &[QuizResult],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> BTreeMap<DifficultyLevel, u32> {
    let mut counts = BTreeMap::new();
    for r in results.iter().filter(|r| window.contains(r.completed_at, now)) {
        *counts.entry(r.difficulty_at_time).or_insert(0_u32) += 1;
    }
    counts
}

//
// ─── ENGAGEMENT ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    /// No recorded activity at all.
    New,
    Low,
    Moderate,
    Engaged,
    HighlyEngaged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub level: EngagementLevel,
    pub score: u8,
    pub active_days_this_week: u32,
}

fn touch_instants<'a>(
    results: &'a [QuizResult],
    lessons: &'a [LessonProgress],
) -> impl Iterator<Item = DateTime<Utc>> + 'a {
    results.iter().map(|r| r.completed_at).chain(
        lessons
            .iter()
            .flat_map(|lp| [Some(lp.last_accessed()), lp.started_at(), lp.completed_at()])
            .flatten(),
    )
}

/// Engagement from distinct active days over the last seven days.
#[must_use]
pub fn engagement(
    results: &[QuizResult],
    lessons: &[LessonProgress],
    now: DateTime<Utc>,
) -> Engagement {
    let mut any = false;
    let days: BTreeSet<NaiveDate> = touch_instants(results, lessons)
        .inspect(|_| any = true)
        .filter(|at| TimeWindow::Week.contains(*at, now))
        .map(|at| at.date_naive())
        .collect();

    if !any {
        return Engagement {
            level: EngagementLevel::New,
            score: 0,
            active_days_this_week: 0,
        };
    }

    let active = u32::try_from(days.len()).unwrap_or(u32::MAX);
    let (level, score) = match active {
        5.. => (EngagementLevel::HighlyEngaged, 100),
        3..=4 => (EngagementLevel::Engaged, 75),
        1..=2 => (EngagementLevel::Moderate, 50),
        0 => (EngagementLevel::Low, 25),
    };

    Engagement {
        level,
        score,
        active_days_this_week: active,
    }
}

//
// ─── ACHIEVEMENTS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    QuizMaster,
    PerfectScore,
    WeekWarrior,
    DedicatedLearner,
    ConsistentExcellence,
}

impl Achievement {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::QuizMaster => "Quiz Master",
            Self::PerfectScore => "Perfect Score",
            Self::WeekWarrior => "Week Warrior",
            Self::DedicatedLearner => "Dedicated Learner",
            Self::ConsistentExcellence => "Consistent Excellence",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::QuizMaster => "Completed 5+ quizzes this week",
            Self::PerfectScore => "Achieved 100% on a quiz",
            Self::WeekWarrior => "7-day learning streak",
            Self::DedicatedLearner => "Accessed 3+ lessons this week",
            Self::ConsistentExcellence => "Scored 80%+ on 3 quizzes",
        }
    }
}

fn achievements(summary: &PeriodSummary, week_results: &[&QuizResult]) -> Vec<Achievement> {
    let mut earned = Vec::new();
    if summary.quizzes_taken >= 5 {
        earned.push(Achievement::QuizMaster);
    }
    if week_results.iter().any(|r| r.score.is_perfect()) {
        earned.push(Achievement::PerfectScore);
    }
    if summary.current_streak >= 7 {
        earned.push(Achievement::WeekWarrior);
    }
    if summary.lessons_accessed >= 3 {
        earned.push(Achievement::DedicatedLearner);
    }
    if week_results.iter().filter(|r| r.score.value() >= 80.0).count() >= 3 {
        earned.push(Achievement::ConsistentExcellence);
    }
    earned
}

//
// ─── WEEKLY REPORT ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayActivity {
    pub weekday: Weekday,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub summary: PeriodSummary,
    pub current_level: DifficultyLevel,
    /// Monday first.
    pub daily_activity: Vec<WeekdayActivity>,
    pub engagement: Engagement,
    pub achievements: Vec<Achievement>,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Last-seven-days report for the dashboard.
#[must_use]
pub fn weekly_report(
    results: &[QuizResult],
    lessons: &[LessonProgress],
    current_level: DifficultyLevel,
    now: DateTime<Utc>,
) -> WeeklyReport {
    let summary = summarize(results, lessons, TimeWindow::Week, now);
    let week_results: Vec<&QuizResult> = results
        .iter()
        .filter(|r| TimeWindow::Week.contains(r.completed_at, now))
        .collect();

    let mut per_weekday = [0_u32; 7];
    for at in touch_instants(results, lessons).filter(|at| TimeWindow::Week.contains(*at, now)) {
        let idx = at.weekday().num_days_from_monday() as usize;
        per_weekday[idx] = per_weekday[idx].saturating_add(1);
    }
    let daily_activity = WEEK
        .iter()
        .zip(per_weekday)
        .map(|(&weekday, count)| WeekdayActivity { weekday, count })
        .collect();

    WeeklyReport {
        achievements: achievements(&summary, &week_results),
        engagement: engagement(results, lessons, now),
        summary,
        current_level,
        daily_activity,
    }
}
