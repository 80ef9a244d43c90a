use services::{AppServices, Clock, EngineSettings};
use storage::repository::Storage;
use tutor_core::model::{
    AccessibilityPreferences, DifficultyLevel, LessonId, QuizId, QuizSubmission, RawScore,
};
use tutor_core::progress::TimeWindow;
use tutor_core::time::fixed_now;

async fn run_concurrently(storage: Storage) {
    let app = AppServices::from_storage(
        &storage,
        Clock::fixed(fixed_now()),
        EngineSettings::default(),
    );
    let student = app
        .students()
        .register("Grace", AccessibilityPreferences::default())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for quiz in 0..8_u64 {
        let quizzes = app.quizzes();
        let id = student.id();
        handles.push(tokio::spawn(async move {
            quizzes
                .submit(QuizSubmission {
                    student_id: id,
                    lesson_id: LessonId::new(1),
                    quiz_id: QuizId::new(quiz),
                    score: RawScore::Percent(95.0),
                    time_spent_secs: 30,
                })
                .await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    // Every submission saw the level left by the one before it.
    let promotions = outcomes.iter().filter(|o| o.transition.changed()).count();
    assert_eq!(promotions, 2);
    for o in &outcomes {
        assert_eq!(o.result.difficulty_at_time, o.transition.from());
    }

    let stored = app.students().get(student.id()).await.unwrap();
    assert_eq!(stored.level(), DifficultyLevel::Advanced);

    let summary = app
        .progress()
        .period_summary(student.id(), TimeWindow::AllTime)
        .await
        .unwrap();
    assert_eq!(summary.quizzes_taken, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_submissions_are_serialized_per_student() {
    run_concurrently(Storage::in_memory()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_submissions_are_serialized_per_student() {
    let storage = Storage::sqlite("sqlite:file:memdb_concurrent?mode=memory&cache=shared")
        .await
        .expect("sqlite storage");
    run_concurrently(storage).await;
}
