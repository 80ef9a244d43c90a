use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tutor_core::EngineSettings;
use tutor_core::model::{AccessibilityPreferences, ContentMode, LessonId, QuizId, RawScore, StudentId};
use tutor_core::progress::TimeWindow;

#[derive(Parser)]
#[command(name = "tutor", version, about = "Adaptive difficulty and progress tracking")]
pub struct Cli {
    /// `SQLite` database URL or file path
    #[arg(long, env = "TUTOR_DB_URL", default_value = "sqlite://tutor.sqlite3", global = true)]
    pub db: String,

    /// Number of recent quiz scores the difficulty policy averages
    #[arg(long, env = "TUTOR_POLICY_WINDOW", default_value_t = 1, global = true)]
    pub policy_window: usize,

    /// Results required inside the window before the level may move
    #[arg(long, env = "TUTOR_POLICY_MIN_RESULTS", default_value_t = 1, global = true)]
    pub policy_min_results: usize,

    /// Summary window returned with each submission: week, month or all
    #[arg(long, env = "TUTOR_SUMMARY_WINDOW", default_value = "week", global = true)]
    pub summary_window: TimeWindow,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn engine_settings(&self) -> anyhow::Result<EngineSettings> {
        EngineSettings::new(
            self.policy_window,
            self.policy_min_results,
            self.summary_window,
        )
        .context("invalid policy configuration")
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new student at the easiest level
    Register {
        #[arg(long)]
        name: String,

        #[command(flatten)]
        preferences: PreferenceArgs,
    },

    /// Record a quiz result and adapt the student's level
    Submit {
        #[arg(long)]
        student: StudentId,

        #[arg(long)]
        lesson: LessonId,

        #[arg(long)]
        quiz: QuizId,

        /// Percentage score, 0 to 100
        #[arg(long, conflicts_with_all = ["correct", "total"], required_unless_present = "correct")]
        score: Option<f64>,

        /// Correct answers; requires --total
        #[arg(long, requires = "total")]
        correct: Option<u32>,

        /// Questions asked; requires --correct
        #[arg(long, requires = "correct")]
        total: Option<u32>,

        /// Seconds spent on the quiz
        #[arg(long, default_value_t = 0)]
        time_spent: u32,
    },

    /// Open a lesson at the student's current level
    OpenLesson {
        #[arg(long)]
        student: StudentId,

        #[arg(long)]
        lesson: LessonId,
    },

    /// Mark a lesson as completed
    CompleteLesson {
        #[arg(long)]
        student: StudentId,

        #[arg(long)]
        lesson: LessonId,
    },

    /// Print a progress report
    Report {
        #[arg(long)]
        student: StudentId,

        /// week, month or all
        #[arg(long, default_value = "week")]
        window: TimeWindow,

        /// Print the last-seven-days report with achievements instead
        #[arg(long)]
        weekly: bool,

        /// Lesson catalog to report completion against (comma-separated ids)
        #[arg(long, value_delimiter = ',')]
        lessons: Vec<LessonId>,
    },

    /// List registered students
    Students {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Print per-day mean scores, oldest day first
    Scores {
        #[arg(long)]
        student: StudentId,

        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,
    },

    /// Update accessibility preferences
    Preferences {
        #[arg(long)]
        student: StudentId,

        #[command(flatten)]
        preferences: PreferenceArgs,
    },

    /// Fill the database with reproducible sample history
    Seed {
        #[arg(long, default_value_t = 3)]
        students: u32,

        /// Days of history per student
        #[arg(long, default_value_t = 14)]
        days: u32,

        /// RNG seed
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

/// Optional overrides; anything left out keeps its current value.
#[derive(Args, Default)]
pub struct PreferenceArgs {
    /// text, audio or simplified
    #[arg(long)]
    pub mode: Option<ContentMode>,

    #[arg(long)]
    pub audio: Option<bool>,

    #[arg(long)]
    pub sign_language: Option<bool>,

    #[arg(long)]
    pub emotion_detection: Option<bool>,

    #[arg(long)]
    pub font_size: Option<u8>,

    #[arg(long)]
    pub high_contrast: Option<bool>,

    #[arg(long)]
    pub reduce_motion: Option<bool>,
}

impl PreferenceArgs {
    pub fn apply_to(
        &self,
        base: &AccessibilityPreferences,
    ) -> anyhow::Result<AccessibilityPreferences> {
        AccessibilityPreferences::new(
            self.mode.unwrap_or(base.preferred_mode()),
            self.audio.unwrap_or(base.audio_enabled()),
            self.sign_language.unwrap_or(base.sign_language_enabled()),
            self.emotion_detection
                .unwrap_or(base.emotion_detection_enabled()),
            self.font_size.unwrap_or(base.font_size()),
            self.high_contrast.unwrap_or(base.high_contrast()),
            self.reduce_motion.unwrap_or(base.reduce_motion()),
        )
        .context("invalid accessibility preferences")
    }
}

pub fn raw_score(
    score: Option<f64>,
    correct: Option<u32>,
    total: Option<u32>,
) -> anyhow::Result<RawScore> {
    match (score, correct, total) {
        (Some(value), None, None) => Ok(RawScore::Percent(value)),
        (None, Some(correct), Some(total)) => Ok(RawScore::Answers { correct, total }),
        _ => anyhow::bail!("provide either --score or both --correct and --total"),
    }
}
