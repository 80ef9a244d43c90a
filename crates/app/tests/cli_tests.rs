//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn tutor(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("tutor").unwrap();
    cmd.env("TUTOR_DB_URL", dir.path().join("tutor.sqlite3"))
        .env_remove("TUTOR_POLICY_WINDOW")
        .env_remove("TUTOR_POLICY_MIN_RESULTS")
        .env_remove("TUTOR_SUMMARY_WINDOW")
        .env("RUST_LOG", "off");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn register_submit_and_report() {
    let dir = TempDir::new().unwrap();

    let student = json_stdout(tutor(&dir).args(["register", "--name", "Ada", "--audio", "true"]));
    assert_eq!(student["level"], "easy");
    let id = student["id"].as_u64().unwrap().to_string();

    let outcome = json_stdout(tutor(&dir).args([
        "submit", "--student", &id, "--lesson", "1", "--quiz", "1", "--score", "85",
    ]));
    assert_eq!(outcome["level"], "medium");
    assert_eq!(outcome["transition"]["from"], "easy");

    let report = json_stdout(tutor(&dir).args([
        "report", "--student", &id, "--window", "all", "--lessons", "1,2",
    ]));
    assert_eq!(report["report"]["summary"]["quizzes_taken"], 1);
    assert_eq!(report["lessons"]["not_started"], 2);
}

#[test]
fn invalid_score_is_rejected() {
    let dir = TempDir::new().unwrap();
    let student = json_stdout(tutor(&dir).args(["register", "--name", "Grace"]));
    let id = student["id"].as_u64().unwrap().to_string();

    tutor(&dir)
        .args([
            "submit", "--student", &id, "--lesson", "1", "--quiz", "1", "--score", "120",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid score"));
}

#[test]
fn unknown_student_fails() {
    let dir = TempDir::new().unwrap();
    tutor(&dir)
        .args(["report", "--student", "77"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown student"));
}

#[test]
fn seed_is_reproducible_per_database() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    let a = json_stdout(tutor(&first).args(["seed", "--students", "2", "--days", "5", "--seed", "3"]));
    let b = json_stdout(tutor(&second).args(["seed", "--students", "2", "--days", "5", "--seed", "3"]));
    assert_eq!(a, b);
    assert_eq!(a.as_array().unwrap().len(), 2);
}

#[test]
fn lists_students_and_daily_scores() {
    let dir = TempDir::new().unwrap();
    for name in ["Ada", "Grace"] {
        json_stdout(tutor(&dir).args(["register", "--name", name]));
    }

    let students = json_stdout(tutor(&dir).args(["students", "--limit", "1"]));
    assert_eq!(students.as_array().unwrap().len(), 1);
    assert_eq!(students[0]["display_name"], "Ada");
    let id = students[0]["id"].as_u64().unwrap().to_string();

    json_stdout(tutor(&dir).args([
        "submit", "--student", &id, "--lesson", "1", "--quiz", "1", "--score", "64",
    ]));
    let scores = json_stdout(tutor(&dir).args(["scores", "--student", &id, "--days", "3"]));
    let days = scores.as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[2]["average"], 64.0);
    assert_eq!(days[2]["quizzes"], 1);
}

#[test]
fn catalog_duplicates_count_once() {
    let dir = TempDir::new().unwrap();
    let student = json_stdout(tutor(&dir).args(["register", "--name", "Ada"]));
    let id = student["id"].as_u64().unwrap().to_string();
    json_stdout(tutor(&dir).args(["complete-lesson", "--student", &id, "--lesson", "1"]));

    let report = json_stdout(tutor(&dir).args([
        "report", "--student", &id, "--lessons", "1,1,2",
    ]));
    assert_eq!(report["lessons"]["completed"], 1);
    assert_eq!(report["lessons"]["completion_percentage"], 50.0);
}
