use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use services::{AppServices, Clock, EngineSettings};
use storage::repository::Storage;
use tutor_core::model::{
    AccessibilityPreferences, DifficultyLevel, LessonId, QuizId, QuizSubmission, RawScore,
    StudentId,
};

const NAMES: [&str; 8] = [
    "Amara", "Bo", "Chidi", "Dana", "Eitan", "Farah", "Gus", "Hana",
];

#[derive(Debug, Clone, Copy)]
pub struct SeedOptions {
    pub students: u32,
    pub days: u32,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeededStudent {
    pub id: StudentId,
    pub name: String,
    pub quizzes: u32,
    pub lessons_completed: u32,
    pub level: DifficultyLevel,
}

fn services_at(storage: &Storage, at: DateTime<Utc>, settings: EngineSettings) -> AppServices {
    AppServices::from_storage(storage, Clock::fixed(at), settings)
}

/// Replay `days` of randomized activity per student through the real services,
/// so levels move exactly as they would for live submissions.
pub async fn seed(
    storage: &Storage,
    settings: EngineSettings,
    options: SeedOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<SeededStudent>> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let start = now - Duration::days(i64::from(options.days));
    let mut seeded = Vec::new();

    for n in 0..options.students {
        let name = NAMES[n as usize % NAMES.len()];
        let prefs = AccessibilityPreferences::default().with_audio(rng.random_bool(0.3));
        let student = services_at(storage, start, settings)
            .students()
            .register(name, prefs)
            .await
            .context("registering seed student")?;

        let mut ability: f64 = rng.random_range(35.0..75.0);
        let mut quizzes = 0_u32;
        let mut lessons_completed = 0_u32;
        let mut level = student.level();

        for day in 0..options.days {
            if !rng.random_bool(0.7) {
                continue;
            }
            let day_start = start + Duration::days(i64::from(day));
            let lesson = LessonId::new(u64::from(day) + 1);

            for attempt in 0..rng.random_range(1..=3_u32) {
                let at = day_start + Duration::hours(rng.random_range(8..20));
                let score = (ability + rng.random_range(-20.0..20.0))
                    .clamp(0.0, 100.0)
                    .round();
                let outcome = services_at(storage, at, settings)
                    .quizzes()
                    .submit(QuizSubmission {
                        student_id: student.id(),
                        lesson_id: lesson,
                        quiz_id: QuizId::new(u64::from(day) * 10 + u64::from(attempt) + 1),
                        score: RawScore::Percent(score),
                        time_spent_secs: rng.random_range(30..240),
                    })
                    .await
                    .context("submitting seed quiz")?;
                level = outcome.level;
                quizzes += 1;
            }

            if rng.random_bool(0.4) {
                let at = day_start + Duration::hours(21);
                services_at(storage, at, settings)
                    .lessons()
                    .complete_lesson(student.id(), lesson)
                    .await
                    .context("completing seed lesson")?;
                lessons_completed += 1;
            }
            ability = (ability + 1.5).min(98.0);
        }

        tracing::info!(student_id = %student.id(), quizzes, %level, "seeded student");
        seeded.push(SeededStudent {
            id: student.id(),
            name: name.to_owned(),
            quizzes,
            lessons_completed,
            level,
        });
    }

    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::progress::TimeWindow;
    use tutor_core::time::fixed_now;

    const OPTIONS: SeedOptions = SeedOptions {
        students: 2,
        days: 10,
        seed: 42,
    };

    #[tokio::test]
    async fn same_seed_same_history() {
        let a = seed(&Storage::in_memory(), EngineSettings::default(), OPTIONS, fixed_now())
            .await
            .unwrap();
        let b = seed(&Storage::in_memory(), EngineSettings::default(), OPTIONS, fixed_now())
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[tokio::test]
    async fn seeded_history_is_reportable() {
        let storage = Storage::in_memory();
        let seeded = seed(&storage, EngineSettings::default(), OPTIONS, fixed_now())
            .await
            .unwrap();

        let app = services_at(&storage, fixed_now(), EngineSettings::default());
        for s in &seeded {
            let summary = app
                .progress()
                .period_summary(s.id, TimeWindow::AllTime)
                .await
                .unwrap();
            assert_eq!(summary.quizzes_taken, s.quizzes);
            assert_eq!(summary.lessons_completed, s.lessons_completed);
            let stored = app.students().get(s.id).await.unwrap();
            assert_eq!(stored.level(), s.level);
        }
    }
}
