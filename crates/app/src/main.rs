//! `tutor`: operator CLI for the adaptive difficulty engine. Prints JSON on stdout.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use services::{AppServices, Clock, EngineSettings};
use storage::repository::Storage;
use tutor_core::model::{AccessibilityPreferences, QuizSubmission};
use tutor_core::progress::LessonOverview;

mod cli;
mod db_url;
mod seed;

use cli::{Cli, Command};

#[derive(Serialize)]
struct ReportOutput<R> {
    report: R,
    #[serde(skip_serializing_if = "Option::is_none")]
    lessons: Option<LessonOverview>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tutor=info,services=info,storage=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings: EngineSettings = cli.engine_settings()?;
    let db_url = db_url::normalize_sqlite_url(&cli.db);
    db_url::prepare_sqlite_file(&db_url)?;
    tracing::debug!(%db_url, ?settings, "starting");

    let storage = Storage::sqlite(&db_url)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    let app = AppServices::from_storage(&storage, Clock::default(), settings);

    match cli.command {
        Command::Register { name, preferences } => {
            let prefs = preferences.apply_to(&AccessibilityPreferences::default())?;
            let student = app.students().register(&name, prefs).await?;
            print_json(&student)
        }
        Command::Submit {
            student,
            lesson,
            quiz,
            score,
            correct,
            total,
            time_spent,
        } => {
            let outcome = app
                .quizzes()
                .submit(QuizSubmission {
                    student_id: student,
                    lesson_id: lesson,
                    quiz_id: quiz,
                    score: cli::raw_score(score, correct, total)?,
                    time_spent_secs: time_spent,
                })
                .await?;
            print_json(&outcome)
        }
        Command::OpenLesson { student, lesson } => {
            let progress = app.lessons().open_lesson(student, lesson).await?;
            print_json(&progress)
        }
        Command::CompleteLesson { student, lesson } => {
            let progress = app.lessons().complete_lesson(student, lesson).await?;
            print_json(&progress)
        }
        Command::Report {
            student,
            window,
            weekly,
            lessons,
        } => {
            let progress = app.progress();
            let overview = if lessons.is_empty() {
                None
            } else {
                Some(progress.lesson_overview(student, &lessons).await?)
            };
            if weekly {
                print_json(&ReportOutput {
                    report: progress.weekly_report(student).await?,
                    lessons: overview,
                })
            } else {
                print_json(&ReportOutput {
                    report: progress.report(student, window).await?,
                    lessons: overview,
                })
            }
        }
        Command::Students { limit } => print_json(&app.students().list(limit).await?),
        Command::Scores { student, days } => {
            print_json(&app.progress().daily_scores(student, days).await?)
        }
        Command::Preferences {
            student,
            preferences,
        } => {
            let students = app.students();
            let current = students.get(student).await?;
            let prefs = preferences.apply_to(current.accessibility())?;
            let updated = students.update_preferences(student, prefs).await?;
            print_json(&updated)
        }
        Command::Seed {
            students,
            days,
            seed: rng_seed,
        } => {
            let options = seed::SeedOptions {
                students,
                days,
                seed: rng_seed,
            };
            let seeded = seed::seed(&storage, settings, options, Clock::default().now()).await?;
            print_json(&seeded)
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
