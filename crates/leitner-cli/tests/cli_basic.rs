//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a temporary data directory and parse
//! its JSON output.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command with `LEITNER_HOME` set to `home` and return output.
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_leitner"))
        .args(args)
        .env("LEITNER_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Run a CLI command, expect success and parse stdout as JSON.
fn run_json(home: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn seed(home: &Path) {
    run_json(home, &["category", "add", "verbs", "Verbs"]);
    for id in ["hablar", "comer", "vivir"] {
        run_json(
            home,
            &["item", "add", id, "--subject", "ana", "--category", "verbs"],
        );
    }
}

#[test]
fn test_item_add_starts_in_box_one() {
    let home = tempfile::tempdir().unwrap();
    run_json(home.path(), &["category", "add", "verbs", "Verbs"]);
    let added = run_json(
        home.path(),
        &["item", "add", "hablar", "--subject", "ana", "--category", "verbs"],
    );
    assert_eq!(added["record"]["box_number"], 1);
    assert_eq!(added["item"]["subject_id"], "ana");

    let categories = run_json(home.path(), &["category", "list"]);
    assert_eq!(categories.as_array().unwrap().len(), 1);
}

#[test]
fn test_review_cycle() {
    let home = tempfile::tempdir().unwrap();
    seed(home.path());

    let due = run_json(
        home.path(),
        &["review", "due", "--subject", "ana", "--order", "oldest_first"],
    );
    let due = due.as_array().unwrap();
    assert_eq!(due.len(), 3);
    assert_eq!(due[0]["item"]["id"], "hablar");

    let outcome = run_json(
        home.path(),
        &["review", "answer", "hablar", "--subject", "ana", "--correct", "--time-spent", "12"],
    );
    assert_eq!(outcome["previous_box"], 1);
    assert_eq!(outcome["new_box"], 2);
    assert_eq!(outcome["advanced"], true);

    let outcome = run_json(
        home.path(),
        &["review", "answer", "comer", "--subject", "ana", "--incorrect"],
    );
    assert_eq!(outcome["new_box"], 1);
    assert_eq!(outcome["demoted"], true);

    let limited = run_json(
        home.path(),
        &["review", "due", "--subject", "ana", "--limit", "1"],
    );
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let shown = run_json(home.path(), &["item", "show", "hablar"]);
    assert_eq!(shown["statistics"]["total_reviews"], 1);
    assert_eq!(shown["statistics"]["is_due"], false);

    let reset = run_json(home.path(), &["item", "reset", "hablar"]);
    assert_eq!(reset["box_number"], 1);
    assert_eq!(reset["correct_count"], 1);
}

#[test]
fn test_stats_commands() {
    let home = tempfile::tempdir().unwrap();
    seed(home.path());
    run_json(
        home.path(),
        &["review", "answer", "vivir", "--subject", "ana", "--correct"],
    );

    let overview = run_json(home.path(), &["stats", "overview", "--subject", "ana"]);
    assert_eq!(overview["total_items"], 3);
    assert_eq!(overview["total_reviews"], 1);
    assert_eq!(overview["overall_accuracy"], 100.0);
    assert_eq!(overview["box_distribution"]["2"], 1);
    assert_eq!(overview["box_distribution"]["5"], 0);

    let history = run_json(
        home.path(),
        &["stats", "history", "--subject", "ana", "--days", "5"],
    );
    assert_eq!(history["dates"].as_array().unwrap().len(), 5);
    assert_eq!(history["totals"][4], 1);

    let streak = run_json(home.path(), &["stats", "streak", "--subject", "ana"]);
    assert_eq!(streak["current_streak"], 1);

    let categories = run_json(home.path(), &["stats", "categories", "--subject", "ana"]);
    assert_eq!(categories[0]["category_name"], "Verbs");
    assert_eq!(categories[0]["total_items"], 3);

    let progress = run_json(
        home.path(),
        &["stats", "progress", "--subject", "ana", "--category", "verbs"],
    );
    assert_eq!(progress["due_today"], 2);
}

#[test]
fn test_config_roundtrip() {
    let home = tempfile::tempdir().unwrap();

    let value = run_json(home.path(), &["config", "get", "review.cards_per_session"]);
    assert_eq!(value["value"], "20");

    run_json(home.path(), &["config", "set", "review.cards_per_session", "2"]);
    let listed = run_json(home.path(), &["config", "list"]);
    assert_eq!(listed["review"]["cards_per_session"], 2);
    assert!(home.path().join("settings.toml").exists());

    // The session cap applies to `review due`.
    seed(home.path());
    let due = run_json(home.path(), &["review", "due", "--subject", "ana", "--limit", "10"]);
    assert_eq!(due.as_array().unwrap().len(), 2);

    let reset = run_json(home.path(), &["config", "reset"]);
    assert_eq!(reset["review"]["cards_per_session"], 20);
}

#[test]
fn test_review_check_uses_strictness() {
    let home = tempfile::tempdir().unwrap();
    let normal = run_json(home.path(), &["review", "check", "Hola", "hola"]);
    assert_eq!(normal["correct"], true);

    run_json(home.path(), &["config", "set", "review.answer_strictness", "strict"]);
    let strict = run_json(home.path(), &["review", "check", "Hola", "hola"]);
    assert_eq!(strict["correct"], false);
    assert_eq!(strict["strictness"], "strict");
}

#[test]
fn test_errors_exit_nonzero() {
    let home = tempfile::tempdir().unwrap();

    let (code, _, stderr) = run_cli(
        home.path(),
        &["review", "answer", "ghost", "--subject", "ana", "--correct"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("ghost"));

    let (code, _, _) = run_cli(home.path(), &["config", "get", "review.nope"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(home.path(), &["config", "set", "review.cards_per_session", "0"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(
        home.path(),
        &["item", "add", "x", "--subject", "ana", "--category", "missing"],
    );
    assert_eq!(code, 1);
}
