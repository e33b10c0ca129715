// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use assert_cmd::Command;
use predicates::prelude::*;

fn commitflow() -> Command {
    let mut cmd = Command::cargo_bin("commitflow").unwrap();
    // Keep the host's keys and overrides out of the run
    cmd.env_clear().env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_generation_flags() {
    commitflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-stream"))
        .stdout(predicate::str::contains("--max-diff-chars"))
        .stdout(predicate::str::contains("providers"));
}

#[test]
fn providers_lists_builtin_adapters() {
    commitflow()
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("anthropic"))
        .stdout(predicate::str::contains("ollama"))
        .stdout(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn config_shows_resolved_defaults() {
    commitflow()
        .args(["--provider", "openai", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: openai"))
        .stdout(predicate::str::contains("Model: gpt-4o-mini"))
        .stdout(predicate::str::contains("API key: not set"));
}

#[test]
fn config_never_prints_the_key() {
    commitflow()
        .env("OPENAI_API_KEY", "sk-very-secret")
        .args(["--provider", "openai", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API key: configured"))
        .stdout(predicate::str::contains("sk-very-secret").not());
}

#[test]
fn invalid_config_value_fails() {
    commitflow()
        .env("COMMITFLOW_TIMEOUT_SECS", "0")
        .arg("providers")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn unknown_commit_type_is_rejected() {
    commitflow()
        .args(["--type", "yolo", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown commit type"));
}

#[test]
fn completions_generate_script() {
    commitflow()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commitflow"));
}
