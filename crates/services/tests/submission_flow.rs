use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use services::{AppServices, Clock, EngineSettings, SubmissionError};
use storage::repository::{
    InMemoryRepository, QuizResultRepository, QuizResultRow, StorageError, Storage,
    StudentRepository,
};
use tutor_core::model::{
    AccessibilityPreferences, DifficultyLevel, LessonId, QuizId, QuizSubmission, RawScore,
    ScoreError, StudentId,
};
use tutor_core::recommend::RecommendationKind;
use tutor_core::time::fixed_now;

fn submission(student_id: StudentId, score: RawScore) -> QuizSubmission {
    QuizSubmission {
        student_id,
        lesson_id: LessonId::new(10),
        quiz_id: QuizId::new(20),
        score,
        time_spent_secs: 90,
    }
}

async fn app_with_student() -> (AppServices, StudentId) {
    let app = AppServices::from_storage(
        &Storage::in_memory(),
        Clock::fixed(fixed_now()),
        EngineSettings::default(),
    );
    let student = app
        .students()
        .register("Ada", AccessibilityPreferences::default())
        .await
        .unwrap();
    (app, student.id())
}

#[tokio::test]
async fn medium_student_scoring_85_moves_to_advanced() {
    let (app, id) = app_with_student().await;
    app.quizzes()
        .submit(submission(id, RawScore::Percent(90.0)))
        .await
        .unwrap();
    assert_eq!(
        app.students().get(id).await.unwrap().level(),
        DifficultyLevel::Medium
    );

    let outcome = app
        .quizzes()
        .submit(submission(id, RawScore::Percent(85.0)))
        .await
        .unwrap();

    assert_eq!(outcome.transition.from(), DifficultyLevel::Medium);
    assert_eq!(outcome.level, DifficultyLevel::Advanced);
    assert_eq!(
        app.students().get(id).await.unwrap().level(),
        DifficultyLevel::Advanced
    );
    assert!(
        !outcome
            .recommendations
            .iter()
            .any(|r| r.message.to_lowercase().contains("review easier"))
    );
}

#[tokio::test]
async fn easy_student_scoring_30_stays_easy_with_support() {
    let (app, id) = app_with_student().await;
    let outcome = app
        .quizzes()
        .submit(submission(id, RawScore::Percent(30.0)))
        .await
        .unwrap();

    assert_eq!(outcome.level, DifficultyLevel::Easy);
    assert!(!outcome.transition.changed());
    assert!(
        outcome
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::Support)
    );
}

#[tokio::test]
async fn advice_matches_policy_bands_at_fractional_scores() {
    let (app, id) = app_with_student().await;
    let near_promote = app
        .quizzes()
        .submit(submission(id, RawScore::Percent(79.96)))
        .await
        .unwrap();
    assert_eq!(near_promote.level, DifficultyLevel::Easy);
    assert!(
        !near_promote
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::Challenge)
    );

    let (app, id) = app_with_student().await;
    let near_demote = app
        .quizzes()
        .submit(submission(id, RawScore::Percent(49.96)))
        .await
        .unwrap();
    assert_eq!(near_demote.level, DifficultyLevel::Easy);
    assert!(
        near_demote
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::Support)
    );
}

#[tokio::test]
async fn invalid_score_changes_nothing() {
    let (app, id) = app_with_student().await;

    for bad in [
        RawScore::Percent(101.0),
        RawScore::Percent(-1.0),
        RawScore::Percent(f64::NAN),
        RawScore::Answers { correct: 6, total: 5 },
    ] {
        let err = app.quizzes().submit(submission(id, bad)).await.unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidScore(_)));
    }

    let err = app
        .quizzes()
        .submit(submission(id, RawScore::Percent(150.0)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SubmissionError::InvalidScore(ScoreError::OutOfRange(_))
    ));

    let summary = app
        .progress()
        .period_summary(id, tutor_core::progress::TimeWindow::AllTime)
        .await
        .unwrap();
    assert_eq!(summary.quizzes_taken, 0);
    assert_eq!(
        app.students().get(id).await.unwrap().level(),
        DifficultyLevel::Easy
    );
}

#[tokio::test]
async fn unknown_student_is_rejected() {
    let (app, _) = app_with_student().await;
    let err = app
        .quizzes()
        .submit(submission(StudentId::new(404), RawScore::Percent(70.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::UnknownStudent(id) if id == StudentId::new(404)));
}

#[tokio::test]
async fn lesson_completion_does_not_change_level() {
    let (app, id) = app_with_student().await;
    let progress = app
        .lessons()
        .complete_lesson(id, LessonId::new(1))
        .await
        .unwrap();
    assert!(progress.is_completed());
    assert_eq!(
        app.students().get(id).await.unwrap().level(),
        DifficultyLevel::Easy
    );

    let overview = app
        .progress()
        .lesson_overview(id, &[LessonId::new(1), LessonId::new(2)])
        .await
        .unwrap();
    assert_eq!(overview.completed, 1);
    assert_eq!(overview.not_started, 1);
}

/// Results repository that refuses every read, to prove validation runs first.
struct Unreachable;

#[async_trait]
impl QuizResultRepository for Unreachable {
    async fn results_for_student(
        &self,
        _: StudentId,
        _: Option<DateTime<Utc>>,
        _: Option<DateTime<Utc>>,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        Err(StorageError::Connection("unreachable".into()))
    }

    async fn recent_results(
        &self,
        _: StudentId,
        _: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        Err(StorageError::Connection("unreachable".into()))
    }
}

#[tokio::test]
async fn storage_errors_propagate_after_validation() {
    let repo = InMemoryRepository::new();
    let student = repo
        .insert_student(
            &tutor_core::model::NewStudent::new(
                "Ada",
                AccessibilityPreferences::default(),
                fixed_now(),
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let storage = Storage {
        students: Arc::new(repo.clone()),
        quiz_results: Arc::new(Unreachable),
        submissions: Arc::new(repo.clone()),
        lessons: Arc::new(repo),
    };
    let settings =
        EngineSettings::new(3, 1, tutor_core::progress::TimeWindow::Week).unwrap();
    let app = AppServices::from_storage(&storage, Clock::fixed(fixed_now()), settings);

    let invalid = app
        .quizzes()
        .submit(submission(student.id(), RawScore::Percent(120.0)))
        .await
        .unwrap_err();
    assert!(matches!(invalid, SubmissionError::InvalidScore(_)));

    let failed = app
        .quizzes()
        .submit(submission(student.id(), RawScore::Percent(70.0)))
        .await
        .unwrap_err();
    assert!(matches!(
        failed,
        SubmissionError::Storage(StorageError::Connection(_))
    ));
}

#[tokio::test]
async fn sqlite_backed_services_round_trip() {
    let app = AppServices::new_sqlite(
        "sqlite:file:memdb_services_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        EngineSettings::default(),
    )
    .await
    .expect("sqlite services");

    let student = app
        .students()
        .register("Katherine", AccessibilityPreferences::default())
        .await
        .unwrap();
    let outcome = app
        .quizzes()
        .submit(submission(student.id(), RawScore::Answers { correct: 9, total: 10 }))
        .await
        .unwrap();
    assert_eq!(outcome.level, DifficultyLevel::Medium);

    let report = app.progress().weekly_report(student.id()).await.unwrap();
    assert_eq!(report.current_level, DifficultyLevel::Medium);
    assert_eq!(report.summary.quizzes_taken, 1);
}

#[tokio::test]
async fn failed_history_read_records_nothing() {
    let repo = InMemoryRepository::new();
    let student = repo
        .insert_student(
            &tutor_core::model::NewStudent::new(
                "Ada",
                AccessibilityPreferences::default(),
                fixed_now(),
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let storage = Storage {
        students: Arc::new(repo.clone()),
        quiz_results: Arc::new(Unreachable),
        submissions: Arc::new(repo.clone()),
        lessons: Arc::new(repo.clone()),
    };
    let app = AppServices::from_storage(&storage, Clock::fixed(fixed_now()), EngineSettings::default());

    let err = app
        .quizzes()
        .submit(submission(student.id(), RawScore::Percent(95.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Storage(StorageError::Connection(_))));

    assert!(repo.recent_results(student.id(), 10).await.unwrap().is_empty());
    assert_eq!(
        repo.get_student(student.id()).await.unwrap().unwrap().level(),
        DifficultyLevel::Easy
    );
}
