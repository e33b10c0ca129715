// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use commitflow::domain::CommitType;

// The normalizer matches lowercased prefixes with `parse`; clap goes through
// `FromStr` for `--type`.

#[test]
fn parse_only_accepts_lowercase_names() {
    assert_eq!(CommitType::parse("refactor"), Some(CommitType::Refactor));
    assert_eq!(CommitType::parse("Refactor"), None);
    assert_eq!(CommitType::parse(" fix"), None);
    assert_eq!(CommitType::parse("feature"), None);
}

#[test]
fn type_flag_ignores_case_and_padding() {
    assert_eq!(" FEAT ".parse::<CommitType>(), Ok(CommitType::Feat));
    assert_eq!("Docs".parse::<CommitType>(), Ok(CommitType::Docs));
}

#[test]
fn type_flag_rejection_names_the_choices() {
    let err = "yolo".parse::<CommitType>().unwrap_err();
    assert!(err.contains("'yolo'"), "got: {err}");
    assert!(err.contains("feat, fix"), "got: {err}");
}

#[test]
fn type_renders_as_prompt_text() {
    assert_eq!(CommitType::Perf.to_string(), "perf");
}
