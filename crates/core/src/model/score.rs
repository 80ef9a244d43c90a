use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score must be between 0 and 100, got {0}")]
    OutOfRange(f64),

    #[error("score must be a finite number")]
    NotFinite,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    TooManyCorrect { correct: u32, total: u32 },
}

//
// ─── SCORE ────────────────────────────────────────────────────────────────────
//

/// Percentage score of a quiz attempt, always within `0.0..=100.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Validates a raw percentage.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NotFinite` for NaN/infinite input and
    /// `ScoreError::OutOfRange` outside `0..=100`.
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() {
            return Err(ScoreError::NotFinite);
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Derives the percentage from answer counts. A quiz with no questions scores 0.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::TooManyCorrect` if `correct > total`.
    pub fn from_answers(correct: u32, total: u32) -> Result<Self, ScoreError> {
        if correct > total {
            return Err(ScoreError::TooManyCorrect { correct, total });
        }
        if total == 0 {
            return Ok(Self(0.0));
        }
        Self::new(f64::from(correct) / f64::from(total) * 100.0)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_perfect(self) -> bool {
        self.0 >= Self::MAX
    }

    /// Short encouragement line shown next to a single result.
    #[must_use]
    pub fn feedback(self) -> &'static str {
        match self.0 {
            s if s >= 90.0 => "Excellent work! You've mastered this material!",
            s if s >= 80.0 => "Great job! You have a strong understanding!",
            s if s >= 70.0 => "Good effort! Keep practicing to improve!",
            s if s >= 60.0 => "You're making progress! Review the material and try again.",
            _ => "Don't give up! Review the lesson and practice more.",
        }
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(Score::new(0.0).unwrap().value(), 0.0);
        assert_eq!(Score::new(100.0).unwrap().value(), 100.0);
    }

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert!(matches!(Score::new(-0.5), Err(ScoreError::OutOfRange(_))));
        assert!(matches!(Score::new(100.1), Err(ScoreError::OutOfRange(_))));
        assert!(matches!(Score::new(f64::NAN), Err(ScoreError::NotFinite)));
    }

    #[test]
    fn derives_from_answers() {
        assert_eq!(Score::from_answers(3, 4).unwrap().value(), 75.0);
        assert_eq!(Score::from_answers(0, 0).unwrap().value(), 0.0);
        assert!(matches!(
            Score::from_answers(5, 4),
            Err(ScoreError::TooManyCorrect { correct: 5, total: 4 })
        ));
    }

    #[test]
    fn feedback_follows_bands() {
        assert!(Score::new(95.0).unwrap().feedback().starts_with("Excellent"));
        assert!(Score::new(80.0).unwrap().feedback().starts_with("Great"));
        assert!(Score::new(10.0).unwrap().feedback().starts_with("Don't give up"));
    }

    #[test]
    fn deserialization_validates() {
        let ok: Score = serde_json::from_str("88.5").unwrap();
        assert_eq!(ok.value(), 88.5);
        assert!(serde_json::from_str::<Score>("140").is_err());
    }
}
