use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{DifficultyLevel, LessonId, QuizId, Score, ScoreError, StudentId};

//
// ─── RAW SCORE ─────────────────────────────────────────────────────────────────
//

/// Score as supplied by the submission entry point, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawScore {
    /// Percentage computed by the caller.
    Percent(f64),
    /// Answer counts; the percentage is derived.
    Answers { correct: u32, total: u32 },
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// Unvalidated quiz submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSubmission {
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub quiz_id: QuizId,
    pub score: RawScore,
    pub time_spent_secs: u32,
}

impl QuizSubmission {
    /// Validate the score without touching any state.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError` if the score is outside `0..=100` or answer counts are inconsistent.
    pub fn validate(&self) -> Result<ValidatedSubmission, ScoreError> {
        let (score, correct_answers, total_questions) = match self.score {
            RawScore::Percent(value) => (Score::new(value)?, None, None),
            RawScore::Answers { correct, total } => {
                (Score::from_answers(correct, total)?, Some(correct), Some(total))
            }
        };

        Ok(ValidatedSubmission {
            student_id: self.student_id,
            lesson_id: self.lesson_id,
            quiz_id: self.quiz_id,
            score,
            correct_answers,
            total_questions,
            time_spent_secs: self.time_spent_secs,
        })
    }
}

/// Submission whose score has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub quiz_id: QuizId,
    pub score: Score,
    pub correct_answers: Option<u32>,
    pub total_questions: Option<u32>,
    pub time_spent_secs: u32,
}

impl ValidatedSubmission {
    /// Stamp the submission with the level it was attempted at.
    #[must_use]
    pub fn into_result(
        self,
        difficulty_at_time: DifficultyLevel,
        completed_at: DateTime<Utc>,
    ) -> QuizResult {
        QuizResult {
            student_id: self.student_id,
            lesson_id: self.lesson_id,
            quiz_id: self.quiz_id,
            score: self.score,
            correct_answers: self.correct_answers,
            total_questions: self.total_questions,
            time_spent_secs: self.time_spent_secs,
            difficulty_at_time,
            completed_at,
        }
    }
}

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

/// One immutable entry of a student's quiz history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub quiz_id: QuizId,
    pub score: Score,
    pub correct_answers: Option<u32>,
    pub total_questions: Option<u32>,
    pub time_spent_secs: u32,
    pub difficulty_at_time: DifficultyLevel,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn submission(score: RawScore) -> QuizSubmission {
        QuizSubmission {
            student_id: StudentId::new(1),
            lesson_id: LessonId::new(2),
            quiz_id: QuizId::new(3),
            score,
            time_spent_secs: 45,
        }
    }

    #[test]
    fn answers_are_converted_to_percent() {
        let validated = submission(RawScore::Answers {
            correct: 4,
            total: 5,
        })
        .validate()
        .unwrap();
        assert_eq!(validated.score.value(), 80.0);
        assert_eq!(validated.total_questions, Some(5));
    }

    #[test]
    fn invalid_percent_is_rejected() {
        let err = submission(RawScore::Percent(101.0)).validate().unwrap_err();
        assert!(matches!(err, ScoreError::OutOfRange(_)));
    }

    #[test]
    fn result_records_level_at_time() {
        let result = submission(RawScore::Percent(55.0))
            .validate()
            .unwrap()
            .into_result(DifficultyLevel::Medium, fixed_now());
        assert_eq!(result.difficulty_at_time, DifficultyLevel::Medium);
        assert_eq!(result.completed_at, fixed_now());
    }
}
