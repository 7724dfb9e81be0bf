mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestHome;

#[test]
fn register_login_logout_round_trip() {
    let home = TestHome::new();

    let output = home
        .cmd()
        .args([
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Lima",
            "--email",
            "ana@example.com",
            "--password",
            "hunter2",
            "--confirm-password",
            "hunter2",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("register json");
    assert_eq!(value["schema_version"], "td.v1");
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["email"], "ana@example.com");

    // Registration does not leave a session behind.
    home.cmd()
        .arg("list")
        .assert()
        .failure()
        .code(3)
        .stderr(contains("Not signed in"));

    home.login("ana@example.com", "hunter2");
    home.cmd().arg("list").assert().success();

    home.cmd().arg("logout").assert().success();
    home.cmd().arg("list").assert().failure().code(3);
}

#[test]
fn register_rejects_duplicate_email() {
    let home = TestHome::new();
    home.register("ana@example.com", "hunter2");

    home.cmd()
        .args([
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Lima",
            "--email",
            "Ana@Example.com",
            "--password",
            "other",
            "--confirm-password",
            "other",
        ])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("already exists for"));
}

#[test]
fn register_rejects_password_mismatch() {
    let home = TestHome::new();
    home.cmd()
        .args([
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Lima",
            "--email",
            "ana@example.com",
            "--password",
            "hunter2",
            "--confirm-password",
            "hunter3",
        ])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn login_with_wrong_password_fails() {
    let home = TestHome::new();
    home.register("ana@example.com", "hunter2");

    home.cmd()
        .args(["login", "ana@example.com", "wrong", "--json"])
        .assert()
        .failure()
        .code(3)
        .stdout(contains("\"kind\": \"permission\""));
}

#[test]
fn forgot_password_requires_known_email() {
    let home = TestHome::new();
    home.register("ana@example.com", "hunter2");

    home.cmd()
        .args(["forgot-password", "ana@example.com"])
        .assert()
        .success();

    home.cmd()
        .args(["forgot-password", "nobody@example.com"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("hint: td register"));
}

#[test]
fn events_to_stdout_suppress_normal_output() {
    let home = TestHome::new();

    let output = home
        .cmd()
        .args([
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Lima",
            "--email",
            "ana@example.com",
            "--password",
            "hunter2",
            "--confirm-password",
            "hunter2",
            "--events",
            "-",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).expect("utf8");
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let event: Value = serde_json::from_str(lines.next().expect("one event")).expect("event json");
    assert_eq!(event["schema_version"], "td.event.v1");
    assert_eq!(event["event"], "registered");
    assert!(lines.next().is_none(), "only the event goes to stdout");
}
