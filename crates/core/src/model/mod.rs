mod accessibility;
mod difficulty;
mod ids;
mod lesson_progress;
mod quiz;
mod score;
mod student;

pub use ids::{LessonId, ParseIdError, QuizId, StudentId};

pub use accessibility::{AccessibilityError, AccessibilityPreferences, ContentMode};
pub use difficulty::{DifficultyError, DifficultyLevel};
pub use lesson_progress::{LessonProgress, LessonProgressError, LessonStatus};
pub use quiz::{QuizResult, QuizSubmission, RawScore, ValidatedSubmission};
pub use score::{Score, ScoreError};
pub use student::{NewStudent, Student, StudentError};
