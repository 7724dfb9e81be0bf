#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An isolated home for one test: its own data directory and an empty
/// config file so nothing leaks in from the host.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        fs::write(dir.path().join("td.toml"), "").expect("write config");
        Self { dir }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("td.toml")
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.config_path(), contents).expect("write config");
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("td").expect("binary");
        cmd.env("TD_DATA_DIR", self.data_dir());
        cmd.env("TD_CONFIG", self.config_path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn register(&self, email: &str, password: &str) {
        self.cmd()
            .args([
                "register",
                "--first-name",
                "Ana",
                "--last-name",
                "Lima",
                "--email",
                email,
                "--password",
                password,
                "--confirm-password",
                password,
            ])
            .assert()
            .success();
    }

    pub fn login(&self, email: &str, password: &str) {
        self.cmd()
            .args(["login", email, password])
            .assert()
            .success();
    }

    /// Register and sign in one user in a single call.
    pub fn signed_in(&self, email: &str) {
        self.register(email, "hunter2");
        self.login(email, "hunter2");
    }

    pub fn add_task(&self, text: &str) -> String {
        let output = self
            .cmd()
            .args(["add", text, "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: Value = serde_json::from_slice(&output).expect("add json");
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    pub fn list_json(&self) -> Value {
        let output = self
            .cmd()
            .args(["list", "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("list json")
    }
}
