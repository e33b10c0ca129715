// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

/// One file-level section of a unified diff, borrowed from the source text.
///
/// `path` is `None` for any preamble that precedes the first `diff --git`
/// header. `text` includes the section's line terminators verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDiff<'a> {
    pub path: Option<&'a str>,
    pub text: &'a str,
}

/// Result of fitting a diff to the prompt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitDecision {
    pub fitted_diff: String,
    /// Content was dropped; the UI should tell the user.
    pub was_modified: bool,
}

impl FitDecision {
    pub fn unchanged(diff: &str) -> Self {
        Self {
            fitted_diff: diff.to_string(),
            was_modified: false,
        }
    }

    /// Nothing to describe. Callers should not attempt generation.
    pub fn is_empty(&self) -> bool {
        self.fitted_diff.trim().is_empty()
    }
}
