use chrono::Duration;
use storage::repository::{
    LessonProgressRepository, QuizResultRepository, QuizSubmissionPersistence, StorageError,
    StudentRepository,
};
use storage::sqlite::SqliteRepository;
use tutor_core::model::{
    AccessibilityPreferences, ContentMode, DifficultyLevel, LessonId, LessonProgress, LessonStatus,
    NewStudent, QuizId, QuizResult, Score, Student, StudentId,
};
use tutor_core::policy::DifficultyPolicy;
use tutor_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn register(repo: &SqliteRepository, name: &str) -> Student {
    let new = NewStudent::new(name, AccessibilityPreferences::default(), fixed_now()).unwrap();
    repo.insert_student(&new).await.unwrap()
}

fn result_at(student: &Student, level: DifficultyLevel, score: f64, minutes: i64) -> QuizResult {
    QuizResult {
        student_id: student.id(),
        lesson_id: LessonId::new(3),
        quiz_id: QuizId::new(7),
        score: Score::new(score).unwrap(),
        correct_answers: Some(4),
        total_questions: Some(5),
        time_spent_secs: 42,
        difficulty_at_time: level,
        completed_at: fixed_now() + Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn sqlite_student_roundtrip_keeps_preferences() {
    let repo = connect("memdb_students").await;

    let prefs = AccessibilityPreferences::default()
        .with_mode(ContentMode::Simplified)
        .with_audio(true)
        .with_font_size(24)
        .unwrap();
    let new = NewStudent::new("  Ada  ", prefs.clone(), fixed_now()).unwrap();
    let student = repo.insert_student(&new).await.unwrap();

    let fetched = repo.get_student(student.id()).await.unwrap().expect("stored");
    assert_eq!(fetched.display_name(), "Ada");
    assert_eq!(fetched.level(), DifficultyLevel::Easy);
    assert_eq!(fetched.accessibility(), &prefs);
    assert_eq!(fetched.created_at(), fixed_now());

    let quieter = prefs.with_audio(false);
    repo.update_accessibility(student.id(), &quieter).await.unwrap();
    let fetched = repo.get_student(student.id()).await.unwrap().unwrap();
    assert!(!fetched.accessibility().audio_enabled());
    assert_eq!(fetched.level(), DifficultyLevel::Easy);

    let missing = repo
        .update_accessibility(StudentId::new(999), &quieter)
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_records_result_and_moves_level_atomically() {
    let repo = connect("memdb_record").await;
    let student = register(&repo, "Grace").await;
    let policy = DifficultyPolicy::default();

    let first = result_at(&student, DifficultyLevel::Easy, 90.0, 1);
    let promote = policy.evaluate(DifficultyLevel::Easy, &[first.score]);
    let id = repo.record_quiz_result(&first, &promote).await.unwrap();
    assert!(id > 0);

    let stored = repo.get_student(student.id()).await.unwrap().unwrap();
    assert_eq!(stored.level(), DifficultyLevel::Medium);
    assert_eq!(stored.last_active(), first.completed_at);

    // A writer still holding the Easy snapshot must not overwrite Medium.
    let stale = result_at(&student, DifficultyLevel::Easy, 95.0, 2);
    let stale_transition = policy.evaluate(DifficultyLevel::Easy, &[stale.score]);
    let err = repo
        .record_quiz_result(&stale, &stale_transition)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let history = repo
        .results_for_student(student.id(), None, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(history[0].result, first);
}

#[tokio::test]
async fn sqlite_unknown_student_is_not_found() {
    let repo = connect("memdb_unknown").await;
    let ghost = NewStudent::new("Ghost", AccessibilityPreferences::default(), fixed_now())
        .unwrap()
        .assign_id(StudentId::new(404));
    let result = result_at(&ghost, DifficultyLevel::Easy, 70.0, 0);
    let transition = DifficultyPolicy::default().evaluate(DifficultyLevel::Easy, &[result.score]);

    let err = repo
        .record_quiz_result(&result, &transition)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_recent_results_are_oldest_first_and_ranges_filter() {
    let repo = connect("memdb_recent").await;
    let student = register(&repo, "Linus").await;
    let policy = DifficultyPolicy::default();

    for (minutes, score) in [(10, 60.0), (20, 65.0), (30, 70.0)] {
        let r = result_at(&student, DifficultyLevel::Easy, score, minutes);
        let t = policy.evaluate(DifficultyLevel::Easy, &[r.score]);
        repo.record_quiz_result(&r, &t).await.unwrap();
    }

    let recent = repo.recent_results(student.id(), 2).await.unwrap();
    let scores: Vec<f64> = recent.iter().map(|r| r.result.score.value()).collect();
    assert_eq!(scores, vec![65.0, 70.0]);

    let from = fixed_now() + Duration::minutes(15);
    let until = fixed_now() + Duration::minutes(25);
    let ranged = repo
        .results_for_student(student.id(), Some(from), Some(until))
        .await
        .unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].result.score.value(), 65.0);
}

#[tokio::test]
async fn sqlite_lesson_progress_upserts() {
    let repo = connect("memdb_lessons").await;
    let student = register(&repo, "Barbara").await;

    let mut progress = LessonProgress::start(
        student.id(),
        LessonId::new(1),
        DifficultyLevel::Easy,
        fixed_now(),
    );
    repo.upsert_progress(&progress).await.unwrap();

    progress.complete(fixed_now() + Duration::minutes(12));
    repo.upsert_progress(&progress).await.unwrap();

    let fetched = repo
        .get_progress(student.id(), LessonId::new(1))
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(fetched.status(), LessonStatus::Completed);
    assert_eq!(fetched.progress_percent(), 100.0);
    assert_eq!(fetched.completed_at(), Some(fixed_now() + Duration::minutes(12)));

    let recent = repo
        .progress_for_student(student.id(), Some(fixed_now() + Duration::minutes(30)))
        .await
        .unwrap();
    assert!(recent.is_empty());
    assert_eq!(
        repo.progress_for_student(student.id(), None).await.unwrap().len(),
        1
    );

    let orphan = LessonProgress::start(
        StudentId::new(999),
        LessonId::new(1),
        DifficultyLevel::Easy,
        fixed_now(),
    );
    let err = repo.upsert_progress(&orphan).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
