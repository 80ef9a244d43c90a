use serde::Serialize;

use crate::model::DifficultyLevel;
use crate::policy::{DEMOTE_BELOW, PROMOTE_AT};
use crate::progress::{PeriodSummary, SpeedRating, Trend};

/// Category of an advisory item, for the presentation layer to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Engagement,
    Support,
    Encouragement,
    Accessibility,
    Achievement,
    Challenge,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: &'static str,
    pub message: &'static str,
}

/// One `(predicate, advice)` row.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRule {
    pub matches: fn(&PeriodSummary, DifficultyLevel) -> bool,
    pub kind: RecommendationKind,
    pub title: &'static str,
    pub message: &'static str,
}

impl RecommendationRule {
    fn to_recommendation(self) -> Recommendation {
        Recommendation {
            kind: self.kind,
            title: self.title,
            message: self.message,
        }
    }
}

fn no_activity(s: &PeriodSummary, _: DifficultyLevel) -> bool {
    !s.has_activity()
}

fn low_average(s: &PeriodSummary, _: DifficultyLevel) -> bool {
    s.mean_score().is_some_and(|avg| avg < DEMOTE_BELOW)
}

fn declining(s: &PeriodSummary, _: DifficultyLevel) -> bool {
    s.trend == Trend::Declining
}

fn slow(s: &PeriodSummary, _: DifficultyLevel) -> bool {
    s.speed == Some(SpeedRating::Slow)
}

fn improving(s: &PeriodSummary, _: DifficultyLevel) -> bool {
    s.trend == Trend::Improving
}

fn ready_for_harder(s: &PeriodSummary, level: DifficultyLevel) -> bool {
    level != DifficultyLevel::Advanced && s.mean_score().is_some_and(|avg| avg >= PROMOTE_AT)
}

fn mastering_top_level(s: &PeriodSummary, level: DifficultyLevel) -> bool {
    level == DifficultyLevel::Advanced && s.mean_score().is_some_and(|avg| avg >= PROMOTE_AT)
}

/// Checked in order; every matching row contributes one item.
pub static RECOMMENDATION_RULES: [RecommendationRule; 7] = [
    RecommendationRule {
        matches: no_activity,
        kind: RecommendationKind::Engagement,
        title: "We Miss You",
        message: "No activity in this period yet. A short lesson today keeps your progress going.",
    },
    RecommendationRule {
        matches: low_average,
        kind: RecommendationKind::Support,
        title: "Review Materials",
        message: "Review easier material and re-read the lesson with audio enabled before the next quiz.",
    },
    RecommendationRule {
        matches: declining,
        kind: RecommendationKind::Encouragement,
        title: "Take Your Time",
        message: "It's okay to slow down. Consider revisiting previous lessons before moving forward.",
    },
    RecommendationRule {
        matches: slow,
        kind: RecommendationKind::Accessibility,
        title: "Accessibility Options",
        message: "Consider enabling text-to-speech or using simpler text mode for easier reading.",
    },
    RecommendationRule {
        matches: improving,
        kind: RecommendationKind::Achievement,
        title: "Great Progress!",
        message: "You're improving steadily. Keep up the excellent work!",
    },
    RecommendationRule {
        matches: ready_for_harder,
        kind: RecommendationKind::Challenge,
        title: "Ready for a Challenge?",
        message: "Try a harder lesson at the next difficulty level.",
    },
    RecommendationRule {
        matches: mastering_top_level,
        kind: RecommendationKind::Challenge,
        title: "Top of the Class",
        message: "You're excelling at the advanced level. Explore new subjects to keep stretching yourself.",
    },
];

const KEEP_GOING: RecommendationRule = RecommendationRule {
    matches: |_, _| true,
    kind: RecommendationKind::General,
    title: "Keep Going!",
    message: "You're doing well. Continue at your own pace.",
};

/// Static, deterministic advice for a period.
///
/// A period with activity that triggers no specific rule gets a general
/// "keep going" item.
#[must_use]
pub fn recommend(summary: &PeriodSummary, level: DifficultyLevel) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = RECOMMENDATION_RULES
        .iter()
        .filter(|rule| (rule.matches)(summary, level))
        .map(|rule| rule.to_recommendation())
        .collect();

    if out.is_empty() && summary.has_activity() {
        out.push(KEEP_GOING.to_recommendation());
    }
    out
}
