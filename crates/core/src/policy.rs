use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DifficultyLevel, Score};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("rolling window must hold at least one score")]
    EmptyWindow,

    #[error("minimum results ({min_results}) cannot exceed window size ({window})")]
    MinResultsExceedWindow { min_results: usize, window: usize },
}

//
// ─── RULE TABLE ────────────────────────────────────────────────────────────────
//

/// Scores at or above this promote one level.
pub const PROMOTE_AT: f64 = 80.0;
/// Scores strictly below this demote one level.
pub const DEMOTE_BELOW: f64 = 50.0;

/// What a matching rule does to the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelAction {
    Promote,
    Demote,
    Keep,
}

impl LevelAction {
    #[must_use]
    pub fn apply(self, level: DifficultyLevel) -> DifficultyLevel {
        match self {
            Self::Promote => level.promoted(),
            Self::Demote => level.demoted(),
            Self::Keep => level,
        }
    }
}

/// One `(predicate, action)` row of the policy table.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRule {
    pub name: &'static str,
    pub matches: fn(f64) -> bool,
    pub action: LevelAction,
}

fn at_or_above_promote(score: f64) -> bool {
    score >= PROMOTE_AT
}

fn below_demote(score: f64) -> bool {
    score < DEMOTE_BELOW
}

fn any_score(_: f64) -> bool {
    true
}

/// Evaluated top to bottom; the first match wins. The last row always matches.
pub static SCORE_RULES: [ScoreRule; 3] = [
    ScoreRule {
        name: "excellent",
        matches: at_or_above_promote,
        action: LevelAction::Promote,
    },
    ScoreRule {
        name: "needs_practice",
        matches: below_demote,
        action: LevelAction::Demote,
    },
    ScoreRule {
        name: "appropriate",
        matches: any_score,
        action: LevelAction::Keep,
    },
];

/// First rule in [`SCORE_RULES`] that matches `score`.
#[must_use]
pub fn matching_rule(score: f64) -> &'static ScoreRule {
    SCORE_RULES
        .iter()
        .find(|rule| (rule.matches)(score))
        .unwrap_or(&SCORE_RULES[SCORE_RULES.len() - 1])
}

/// Pure state-machine step: `(current, score) -> next`.
#[must_use]
pub fn next_level(current: DifficultyLevel, score: Score) -> DifficultyLevel {
    matching_rule(score.value()).action.apply(current)
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// How many recent scores feed a decision.
///
/// The default (`window = 1`, `min_results = 1`) decides on the latest attempt only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicySettings {
    window: usize,
    min_results: usize,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            window: 1,
            min_results: 1,
        }
    }
}

impl PolicySettings {
    /// # Errors
    ///
    /// Returns `PolicyError` if the window is empty or smaller than `min_results`.
    pub fn new(window: usize, min_results: usize) -> Result<Self, PolicyError> {
        if window == 0 {
            return Err(PolicyError::EmptyWindow);
        }
        if min_results > window {
            return Err(PolicyError::MinResultsExceedWindow {
                min_results,
                window,
            });
        }
        Ok(Self {
            window,
            min_results: min_results.max(1),
        })
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn min_results(&self) -> usize {
        self.min_results
    }

    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.window > 1
    }
}

//
// ─── TRANSITION ────────────────────────────────────────────────────────────────
//

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelTransition {
    from: DifficultyLevel,
    to: DifficultyLevel,
    action: LevelAction,
    evaluated: Option<f64>,
    reason: String,
}

impl LevelTransition {
    fn keep(level: DifficultyLevel, evaluated: Option<f64>, reason: impl Into<String>) -> Self {
        Self {
            from: level,
            to: level,
            action: LevelAction::Keep,
            evaluated,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn from(&self) -> DifficultyLevel {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> DifficultyLevel {
        self.to
    }

    #[must_use]
    pub fn action(&self) -> LevelAction {
        self.action
    }

    /// The score (or window average) the decision was made on.
    #[must_use]
    pub fn evaluated(&self) -> Option<f64> {
        self.evaluated
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Score-band difficulty policy.
///
/// # Examples
///
/// ```
/// # use tutor_core::model::{DifficultyLevel, Score};
/// # use tutor_core::policy::DifficultyPolicy;
/// let policy = DifficultyPolicy::default();
/// let t = policy.evaluate(DifficultyLevel::Medium, &[Score::new(85.0)?]);
/// assert_eq!(t.to(), DifficultyLevel::Advanced);
/// # Ok::<(), tutor_core::model::ScoreError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifficultyPolicy {
    settings: PolicySettings,
}

impl DifficultyPolicy {
    #[must_use]
    pub fn new(settings: PolicySettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> PolicySettings {
        self.settings
    }

    /// Decide the next level from recent scores, ordered oldest to newest.
    ///
    /// Only the last `window` scores are considered. In rolling mode an
    /// average sitting exactly on a band boundary keeps the current level.
    #[must_use]
    pub fn evaluate(&self, current: DifficultyLevel, recent: &[Score]) -> LevelTransition {
        let take = recent.len().min(self.settings.window);
        let window = &recent[recent.len() - take..];

        if window.is_empty() {
            return LevelTransition::keep(current, None, "No quiz results yet");
        }
        if window.len() < self.settings.min_results {
            return LevelTransition::keep(current, None, "Not enough data");
        }

        #[allow(clippy::cast_precision_loss)]
        let evaluated = window.iter().map(|s| s.value()).sum::<f64>() / window.len() as f64;

        if self.settings.is_rolling() && is_on_boundary(evaluated) {
            return LevelTransition::keep(
                current,
                Some(evaluated),
                format!("Average of {evaluated:.0}% sits on a band boundary"),
            );
        }

        let rule = matching_rule(evaluated);
        let to = rule.action.apply(current);
        let reason = match rule.action {
            LevelAction::Promote if to != current => {
                format!("Excellent performance (avg: {evaluated:.0}%)")
            }
            LevelAction::Promote => format!("Already at the highest level (avg: {evaluated:.0}%)"),
            LevelAction::Demote if to != current => {
                format!("Need more practice (avg: {evaluated:.0}%)")
            }
            LevelAction::Demote => format!("Already at the easiest level (avg: {evaluated:.0}%)"),
            LevelAction::Keep => "Performance is appropriate for current level".to_owned(),
        };

        LevelTransition {
            from: current,
            to,
            action: rule.action,
            evaluated: Some(evaluated),
            reason,
        }
    }
}

fn is_on_boundary(average: f64) -> bool {
    (average - PROMOTE_AT).abs() < f64::EPSILON || (average - DEMOTE_BELOW).abs() < f64::EPSILON
}
