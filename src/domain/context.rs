// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use super::CommitType;

/// Everything the prompt template needs, already fitted to the size budget.
#[derive(Debug)]
pub struct PromptContext {
    pub branch: Option<String>,
    pub files: Vec<String>,
    pub commit_type: Option<CommitType>,
    pub diff: String,
}

impl PromptContext {
    pub fn to_prompt(&self) -> String {
        format!(
            r#"Analyze this git diff and generate a commit message.
{branch}
FILES:
{files}{commit_type}

DIFF:
{diff}

Write a single Conventional Commits message describing the changes shown in the diff.
The subject must be specific - describe WHAT was changed (e.g., "add retry budget to http client", "update dependency versions").
Reply with the commit message only."#,
            branch = self
                .branch
                .as_ref()
                .map(|b| format!("BRANCH: {b}\n"))
                .unwrap_or_default(),
            files = self
                .files
                .iter()
                .map(|f| format!("- {f}"))
                .collect::<Vec<_>>()
                .join("\n"),
            commit_type = self
                .commit_type
                .map(|t| format!("\nCOMMIT TYPE: {t}"))
                .unwrap_or_default(),
            diff = self.diff.trim_end(),
        )
    }
}
