use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn td_help_works() {
    Command::cargo_bin("td")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("To-Do List"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "register",
        "login",
        "logout",
        "forgot-password",
        "add",
        "list",
        "edit",
        "done",
        "rm",
        "profile",
    ];

    for cmd in subcommands {
        Command::cargo_bin("td")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}
