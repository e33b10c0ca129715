// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Turns raw provider text into a clean Conventional Commits message.
//!
//! Every cleanup rule only ever removes text (or re-renders structured JSON
//! into a strictly shorter plain form). The rules run until nothing changes,
//! which makes the result a fixed point: sanitizing it again is a no-op.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::CommitType;
use crate::error::{Error, Result};

/// Structured commit message some models reply with.
#[derive(Debug, Deserialize)]
struct StructuredCommit {
    #[serde(rename = "type")]
    commit_type: String,
    scope: Option<String>,
    subject: String,
    body: Option<String>,
}

static CONVENTIONAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[A-Za-z]+)(?:\([^()\r\n]*\))?!?:[ \t]*").expect("valid regex")
});

static PREAMBLE_PATTERNS: &[&str] = &[
    "here's the commit message",
    "here is the commit message",
    "here's a commit message",
    "here is a commit message",
    "suggested commit message",
    "suggested commit",
    "commit message",
];

static PROSE_MARKERS: &[&str] = &["explanation:", "this commit message"];

const SOURCE: &str = "normalizer";

/// Normalize a provider reply.
///
/// `commit_type` is the type the caller intends to use. When a reply stacks
/// another type in front of it (`feat: fix: ...` for `fix`), the foreign
/// prefix is dropped. A missing type is never injected.
pub fn sanitize_response(raw: &str, commit_type: Option<CommitType>) -> Result<String> {
    let mut current = raw.to_string();

    loop {
        let next = clean_once(&current, commit_type)?;
        if next == current || next.len() >= current.len() {
            break;
        }
        current = next;
    }

    if current.is_empty() {
        return Err(Error::malformed(SOURCE, "empty commit message"));
    }

    Ok(current)
}

fn clean_once(text: &str, commit_type: Option<CommitType>) -> Result<String> {
    let text = text.trim();

    if let Some(structured) = try_parse_json(text) {
        let rendered = format_structured(&structured)?;
        if rendered.len() < text.len() {
            return Ok(rendered);
        }
    }

    let text = strip_code_fence(text);
    let text = strip_enclosing_quotes(text);
    let text = strip_preamble(text);
    let text = strip_duplicate_prefix(text, commit_type);
    let text = cut_trailing_prose(&text);

    Ok(collapse_blank_lines(text))
}

fn try_parse_json(text: &str) -> Option<StructuredCommit> {
    if !text.starts_with('{') {
        return None;
    }
    serde_json::from_str(text).ok()
}

fn format_structured(s: &StructuredCommit) -> Result<String> {
    let commit_type = s.commit_type.trim().to_lowercase();
    if CommitType::parse(&commit_type).is_none() {
        return Err(Error::malformed(
            SOURCE,
            format!(
                "invalid commit type '{}', expected one of: {}",
                commit_type,
                CommitType::ALL.join(", ")
            ),
        ));
    }

    let subject = s.subject.trim().trim_end_matches('.');
    let first_line = match s.scope.as_deref().map(str::trim) {
        Some(scope) if !scope.is_empty() => format!("{commit_type}({scope}): {subject}"),
        _ => format!("{commit_type}: {subject}"),
    };

    Ok(match s.body.as_deref().map(str::trim) {
        Some(body) if !body.is_empty() => format!("{first_line}\n\n{body}"),
        _ => first_line,
    })
}

/// Removes an opening ```lang line and a matching closing fence.
fn strip_code_fence(text: &str) -> &str {
    let Some(after_open) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the rest of the opening line (the language tag).
    let inner = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };
    let inner = inner.trim_end();
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn strip_enclosing_quotes(text: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].trim();
        }
    }
    text
}

fn strip_preamble(text: &str) -> &str {
    for pattern in PREAMBLE_PATTERNS {
        let matched = text
            .get(..pattern.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(pattern));
        if matched {
            let rest = &text[pattern.len()..];
            let rest = rest.trim_start_matches([' ', '\t']);
            if let Some(rest) = rest.strip_prefix(':') {
                return rest.trim();
            }
        }
    }
    text
}

/// `feat: feat: add x` becomes `feat: add x`. Two different types are left
/// alone unless the inner one is the hinted type, in which case the outer
/// prefix goes.
fn strip_duplicate_prefix(text: &str, commit_type: Option<CommitType>) -> Cow<'_, str> {
    let Some(outer) = CONVENTIONAL_PREFIX.captures(text) else {
        return Cow::Borrowed(text);
    };
    let outer_type = outer["type"].to_ascii_lowercase();
    let outer_len = outer[0].len();
    let rest = &text[outer_len..];

    let Some(inner) = CONVENTIONAL_PREFIX.captures(rest) else {
        return Cow::Borrowed(text);
    };
    let inner_type = inner["type"].to_ascii_lowercase();
    if CommitType::parse(&inner_type).is_none() {
        return Cow::Borrowed(text);
    }

    if inner_type == outer_type {
        // Keep the outer prefix (it may carry the scope), drop the inner one.
        let mut kept = String::with_capacity(text.len());
        kept.push_str(&text[..outer_len]);
        kept.push_str(&rest[inner[0].len()..]);
        return Cow::Owned(kept);
    }

    if commit_type.is_some_and(|t| t.as_str() == inner_type) {
        return Cow::Borrowed(rest);
    }

    Cow::Borrowed(text)
}

/// Cuts everything from the first explanatory line after the subject.
fn cut_trailing_prose(text: &str) -> &str {
    let mut offset = 0;
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if index > 0 && is_prose_boundary(line.trim()) {
            return text[..offset].trim_end();
        }
        offset += line.len();
    }
    text
}

fn is_prose_boundary(line: &str) -> bool {
    if matches!(line, "---" | "***" | "___") || line.starts_with("```") {
        return true;
    }
    let lower = line.to_lowercase();
    PROSE_MARKERS.iter().any(|marker| lower.starts_with(marker))
}

/// Trailing whitespace per line goes, and blank runs shrink to one line.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = false;

    for line in text.lines() {
        let line = line.trim_end();
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        previous_blank = blank;
    }

    out.trim().to_string()
}
