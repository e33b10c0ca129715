// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Pre-flight diff fitting: drop excluded files, then bound the size.
//!
//! Both stages are pure. Retained sections are copied byte-for-byte from the
//! input, so filtering never rewrites the content of a file that survives.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::domain::{FileDiff, FitDecision};
use crate::error::{Error, Result};

/// Lock files whose content is noise in a commit prompt.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "go.sum",
    "Gemfile.lock",
    "poetry.lock",
    "composer.lock",
];

const FILE_HEADER: &str = "diff --git ";
const HUNK_HEADER: &str = "@@";

/// Compiled exclude patterns.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    globs: GlobSet,
}

impl ExclusionSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|e| {
                Error::Config(format!("invalid exclude pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }

        let globs = builder
            .build()
            .map_err(|e| Error::Config(format!("invalid exclude patterns: {e}")))?;
        Ok(Self { globs })
    }

    pub fn empty() -> Self {
        Self {
            globs: GlobSet::empty(),
        }
    }

    /// Matches the full path first, then the bare file name, so `go.sum`
    /// also excludes `tools/go.sum`.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.globs.is_match(path) {
            return true;
        }
        Path::new(path)
            .file_name()
            .is_some_and(|name| self.globs.is_match(name))
    }
}

/// Split a unified diff into file sections, in input order.
pub fn split_file_diffs(diff: &str) -> Vec<FileDiff<'_>> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in diff.split_inclusive('\n') {
        if offset > start && line.starts_with(FILE_HEADER) {
            sections.push(file_section(&diff[start..offset]));
            start = offset;
        }
        offset += line.len();
    }

    if start < diff.len() {
        sections.push(file_section(&diff[start..]));
    }

    sections
}

fn file_section(text: &str) -> FileDiff<'_> {
    let path = if text.starts_with(FILE_HEADER) {
        section_path(text)
    } else {
        None
    };
    FileDiff { path, text }
}

/// Prefer the `+++` target, fall back to `---` for deletions, then to the
/// `diff --git a/x b/x` header (binary files have no `+++` line).
fn section_path(text: &str) -> Option<&str> {
    let mut deleted_from = None;

    for line in text.lines().skip(1) {
        if line.starts_with(HUNK_HEADER) {
            break;
        }
        if let Some(target) = line.strip_prefix("+++ ") {
            let target = clean_path(target);
            if target != "/dev/null" {
                return Some(target.strip_prefix("b/").unwrap_or(target));
            }
        } else if let Some(source) = line.strip_prefix("--- ") {
            let source = clean_path(source);
            if source != "/dev/null" {
                deleted_from = Some(source.strip_prefix("a/").unwrap_or(source));
            }
        }
    }

    if deleted_from.is_some() {
        return deleted_from;
    }

    let header = text.lines().next()?.strip_prefix(FILE_HEADER)?;
    let split = header.rfind(" b/")?;
    Some(clean_path(&header[split + 3..]))
}

fn clean_path(raw: &str) -> &str {
    raw.trim_end().trim_matches('"')
}

/// File paths touched by `diff`, in order of appearance.
pub fn changed_paths(diff: &str) -> Vec<String> {
    split_file_diffs(diff)
        .into_iter()
        .filter_map(|section| section.path.map(str::to_string))
        .collect()
}

/// Drop every file section whose path matches an exclusion.
pub fn filter_excluded(diff: &str, exclusions: &ExclusionSet) -> String {
    split_file_diffs(diff)
        .into_iter()
        .filter(|section| !section.path.is_some_and(|p| exclusions.is_excluded(p)))
        .map(|section| section.text)
        .collect()
}

/// Bound `diff` to `max_len` characters.
///
/// A diff that already fits comes back unchanged. Otherwise whole segments
/// (file headers and `@@` hunks) are kept from the start while they fit, and
/// a marker naming how many files were cut short is appended when there is
/// room for it. If even the first segment is too large, whole lines are kept
/// instead. Lines are never split.
pub fn maybe_summarize_diff(diff: &str, max_len: usize) -> FitDecision {
    if diff.chars().count() <= max_len {
        return FitDecision::unchanged(diff);
    }

    FitDecision {
        fitted_diff: truncate_at_boundaries(diff, max_len),
        was_modified: true,
    }
}

/// Filter then size-fit: the full pre-flight pipeline.
pub fn fit_diff(diff: &str, exclusions: &ExclusionSet, max_len: usize) -> FitDecision {
    let filtered = filter_excluded(diff, exclusions);
    let decision = maybe_summarize_diff(&filtered, max_len);

    debug!(
        raw_chars = diff.chars().count(),
        filtered_chars = filtered.chars().count(),
        fitted_chars = decision.fitted_diff.chars().count(),
        was_modified = decision.was_modified,
        "diff fitted"
    );

    decision
}

fn truncate_at_boundaries(diff: &str, max_len: usize) -> String {
    let sections = split_file_diffs(diff);
    let total_files = sections
        .iter()
        .filter(|s| s.text.starts_with(FILE_HEADER))
        .count();

    // The marker is widest when every file is omitted; reserve that much.
    let reserve = truncation_marker(total_files, total_files).chars().count();
    let (budget, with_marker) = if max_len > reserve {
        (max_len - reserve, true)
    } else {
        (max_len, false)
    };

    let mut cut = take_while_fits(segments(diff), budget);
    if cut == 0 {
        cut = take_while_fits(diff.split_inclusive('\n'), budget);
    }

    let mut fitted = diff[..cut].to_string();

    if with_marker {
        let mut end = 0;
        let mut omitted = 0;
        for section in &sections {
            end += section.text.len();
            if section.text.starts_with(FILE_HEADER) && end > cut {
                omitted += 1;
            }
        }
        fitted.push_str(&truncation_marker(omitted, total_files));
    }

    fitted
}

/// Byte length of the longest prefix of whole pieces within `budget` chars.
fn take_while_fits<'a>(pieces: impl IntoIterator<Item = &'a str>, budget: usize) -> usize {
    let mut used = 0;
    let mut cut = 0;

    for piece in pieces {
        let chars = piece.chars().count();
        if used + chars > budget {
            break;
        }
        used += chars;
        cut += piece.len();
    }

    cut
}

fn segments(diff: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in diff.split_inclusive('\n') {
        if offset > start && (line.starts_with(FILE_HEADER) || line.starts_with(HUNK_HEADER)) {
            out.push(&diff[start..offset]);
            start = offset;
        }
        offset += line.len();
    }

    if start < diff.len() {
        out.push(&diff[start..]);
    }

    out
}

fn truncation_marker(omitted: usize, total: usize) -> String {
    if total == 0 {
        "... (diff truncated)\n".to_string()
    } else {
        format!("... (diff truncated: {omitted} of {total} files not fully shown)\n")
    }
}
