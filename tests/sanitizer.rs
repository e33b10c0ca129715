// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use commitflow::domain::CommitType;
use commitflow::error::Error;
use commitflow::services::sanitizer::sanitize_response;
use proptest::prelude::*;

fn sanitize(raw: &str) -> String {
    sanitize_response(raw, None).unwrap()
}

// ─── JSON parsing tests ───────────────────────────────────────────────────────

#[test]
fn sanitize_valid_json() {
    let raw = r#"{"type": "feat", "scope": "cli", "subject": "add verbose flag", "body": null}"#;
    insta::assert_snapshot!(sanitize(raw), @"feat(cli): add verbose flag");
}

#[test]
fn sanitize_json_in_code_fence() {
    let raw = r#"```json
{"type": "fix", "scope": "git", "subject": "handle detached HEAD state", "body": null}
```"#;
    insta::assert_snapshot!(sanitize(raw), @"fix(git): handle detached HEAD state");
}

#[test]
fn sanitize_json_with_body() {
    let raw = r#"{"type": "feat", "scope": "llm", "subject": "add streaming support.", "body": "Uses tokio-stream to stream tokens.\nImproves perceived latency."}"#;
    assert_eq!(
        sanitize(raw),
        "feat(llm): add streaming support\n\nUses tokio-stream to stream tokens.\nImproves perceived latency."
    );
}

#[test]
fn sanitize_json_without_scope() {
    let raw = r#"{"type": "FEAT", "scope": "  ", "subject": "add verbose flag"}"#;
    insta::assert_snapshot!(sanitize(raw), @"feat: add verbose flag");
}

#[test]
fn sanitize_json_invalid_type() {
    let raw = r#"{"type": "yolo", "scope": "cli", "subject": "ship it", "body": null}"#;
    let result = sanitize_response(raw, None);
    assert!(
        matches!(result, Err(Error::MalformedResponse { .. })),
        "expected MalformedResponse for invalid commit type 'yolo', got {result:?}"
    );
}

// ─── Plain text tests ─────────────────────────────────────────────────────────

#[test]
fn sanitize_plain_text_conventional() {
    insta::assert_snapshot!(sanitize("feat(cli): add --dry-run flag"), @"feat(cli): add --dry-run flag");
}

#[test]
fn sanitize_plain_with_preamble() {
    let raw = "Here's the commit message: feat(cli): add --dry-run flag";
    insta::assert_snapshot!(sanitize(raw), @"feat(cli): add --dry-run flag");
}

#[test]
fn sanitize_preamble_is_case_insensitive() {
    let raw = "SUGGESTED COMMIT:\nfix: handle empty diff";
    insta::assert_snapshot!(sanitize(raw), @"fix: handle empty diff");
}

#[test]
fn sanitize_preamble_needs_colon() {
    let raw = "commit message parsing now handles CRLF";
    assert_eq!(sanitize(raw), raw);
}

#[test]
fn sanitize_plain_with_quotes() {
    insta::assert_snapshot!(sanitize(r#""fix(git): handle missing remote""#), @"fix(git): handle missing remote");
    insta::assert_snapshot!(sanitize("`docs: fix typo`"), @"docs: fix typo");
}

#[test]
fn sanitize_plain_code_fence() {
    let raw = "```\nchore: bump deps\n```";
    insta::assert_snapshot!(sanitize(raw), @"chore: bump deps");
}

#[test]
fn sanitize_fence_and_quotes_together() {
    let raw = "```text\n\"refactor: split fitting module\"\n```";
    insta::assert_snapshot!(sanitize(raw), @"refactor: split fitting module");
}

// ─── Duplicate prefixes ───────────────────────────────────────────────────────

#[test]
fn sanitize_duplicate_type_prefix() {
    insta::assert_snapshot!(sanitize("feat: feat: add x"), @"feat: add x");
}

#[test]
fn sanitize_duplicate_prefix_keeps_scope() {
    insta::assert_snapshot!(sanitize("feat(api): feat: add x"), @"feat(api): add x");
}

#[test]
fn sanitize_different_types_are_left_alone() {
    assert_eq!(sanitize("fix: feat: flag parsing"), "fix: feat: flag parsing");
}

#[test]
fn sanitize_hint_keeps_the_hinted_type() {
    let result = sanitize_response("feat: fix: add x", Some(CommitType::Fix)).unwrap();
    assert_eq!(result, "fix: add x");
}

#[test]
fn sanitize_hint_on_outer_type_leaves_both() {
    let result = sanitize_response("feat: fix: add x", Some(CommitType::Feat)).unwrap();
    assert_eq!(result, "feat: fix: add x");
}

#[test]
fn sanitize_hinted_duplicate_collapses() {
    let result = sanitize_response("fix: fix: add x", Some(CommitType::Fix)).unwrap();
    assert_eq!(result, "fix: add x");
}

#[test]
fn sanitize_never_injects_a_type() {
    let result = sanitize_response("add x", Some(CommitType::Feat)).unwrap();
    assert_eq!(result, "add x");
}

// ─── Trailing prose ───────────────────────────────────────────────────────────

#[test]
fn sanitize_cuts_explanation() {
    let raw = "feat: add x\n\nExplanation: this adds x because y";
    insta::assert_snapshot!(sanitize(raw), @"feat: add x");
}

#[test]
fn sanitize_cuts_after_rule() {
    let raw = "fix: handle timeout\n\nRetry once on 504.\n---\nThis commit message follows Conventional Commits.";
    assert_eq!(sanitize(raw), "fix: handle timeout\n\nRetry once on 504.");
}

#[test]
fn sanitize_keeps_note_paragraph() {
    let raw = "fix: handle y\n\nNote: requires restart of daemon";
    assert_eq!(sanitize(raw), raw);
}

#[test]
fn sanitize_collapses_blank_lines() {
    let raw = "feat: add x   \n\n\n\nbody line   \n\n";
    assert_eq!(sanitize(raw), "feat: add x\n\nbody line");
}

// ─── Edge cases ───────────────────────────────────────────────────────────────

#[test]
fn sanitize_empty_input() {
    let result = sanitize_response("", None);
    assert!(matches!(result, Err(Error::MalformedResponse { .. })));
}

#[test]
fn sanitize_whitespace_only() {
    let result = sanitize_response("   \n\t  ", None);
    assert!(result.is_err(), "expected Err for whitespace-only input");
}

#[test]
fn sanitize_empty_fence() {
    let result = sanitize_response("```\n```", None);
    assert!(result.is_err(), "expected Err for an empty code fence");
}

#[test]
fn sanitize_non_ascii_passes_through() {
    assert_eq!(sanitize("docs: 添加中文说明"), "docs: 添加中文说明");
    // Preamble matching must not slice inside a multi-byte character
    let accented = format!("{}: fix", "é".repeat(20));
    assert_eq!(sanitize(&accented), accented);
}

// ─── Properties ───────────────────────────────────────────────────────────────

fn model_like_reply() -> impl Strategy<Value = String> {
    "(```[a-z]{0,4}\n)?(\"|')?(Here's the commit message: |Commit message:\n)?(feat|fix|docs)(\\([a-z]{1,6}\\))?: (feat: )?[a-z ]{1,24}(\n\n[A-Za-z .]{0,30})?(\n\n\n)?(\nExplanation: [a-z ]{0,10}|\n---\n[a-z]{0,8})?(\"|')?(\n```)?"
}

proptest! {
    #[test]
    fn sanitizer_never_panics(raw in ".*") {
        let _ = sanitize_response(&raw, None);
    }

    #[test]
    fn sanitizer_is_idempotent(raw in prop_oneof![".*", model_like_reply()]) {
        if let Ok(once) = sanitize_response(&raw, Some(CommitType::Feat)) {
            let twice = sanitize_response(&once, Some(CommitType::Feat));
            prop_assert_eq!(twice.ok(), Some(once));
        }
    }
}
