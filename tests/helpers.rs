// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

// Each test binary uses a different subset.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use commitflow::error::{Error, Result};
use commitflow::services::llm::{CommitClient, DeltaSink, StreamingClient};

/// Build a one-hunk unified diff section for `path` adding `lines` lines.
pub fn file_diff(path: &str, lines: usize) -> String {
    let mut diff = format!(
        "diff --git a/{path} b/{path}\nindex 1111111..2222222 100644\n--- a/{path}\n+++ b/{path}\n@@ -1,0 +1,{lines} @@\n"
    );
    for i in 0..lines {
        diff.push_str(&format!("+line {i} of {path}\n"));
    }
    diff
}

/// A file section with several hunks of `lines_per_hunk` added lines each.
pub fn multi_hunk_diff(path: &str, hunks: usize, lines_per_hunk: usize) -> String {
    let mut diff = format!(
        "diff --git a/{path} b/{path}\nindex 1111111..2222222 100644\n--- a/{path}\n+++ b/{path}\n"
    );
    for h in 0..hunks {
        let start = h * 100 + 1;
        diff.push_str(&format!("@@ -{start},0 +{start},{lines_per_hunk} @@\n"));
        for i in 0..lines_per_hunk {
            diff.push_str(&format!("+hunk {h} line {i}\n"));
        }
    }
    diff
}

/// A deletion: the `+++` side is `/dev/null`.
pub fn deleted_file_diff(path: &str) -> String {
    format!(
        "diff --git a/{path} b/{path}\ndeleted file mode 100644\nindex 3333333..0000000\n--- a/{path}\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-gone\n-too\n"
    )
}

/// What a scripted call ends with.
#[derive(Debug, Clone)]
pub enum Outcome {
    Text(String),
    Transport(String),
    Malformed(String),
    /// Never completes and ignores the cancellation token.
    Hang,
}

/// Scripted incremental call: deliver `deltas`, then end with `end`.
///
/// `Outcome::Text` ends successfully with the concatenation of the deltas;
/// its payload is ignored.
#[derive(Debug, Clone)]
pub struct StreamScript {
    pub deltas: Vec<String>,
    pub end: Outcome,
}

impl StreamScript {
    pub fn completes(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| (*d).to_string()).collect(),
            end: Outcome::Text(String::new()),
        }
    }

    pub fn fails_after(deltas: &[&str], message: &str) -> Self {
        Self {
            deltas: deltas.iter().map(|d| (*d).to_string()).collect(),
            end: Outcome::Transport(message.to_string()),
        }
    }

    pub fn hangs_after(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| (*d).to_string()).collect(),
            end: Outcome::Hang,
        }
    }
}

/// In-memory client double with call counters.
pub struct FakeClient {
    pub name: String,
    pub blocking: Outcome,
    pub stream: Option<StreamScript>,
    pub blocking_calls: Arc<AtomicUsize>,
    pub stream_calls: Arc<AtomicUsize>,
}

impl FakeClient {
    pub fn blocking_only(outcome: Outcome) -> Self {
        Self {
            name: "fake".into(),
            blocking: outcome,
            stream: None,
            blocking_calls: Arc::default(),
            stream_calls: Arc::default(),
        }
    }

    pub fn streaming(script: StreamScript, blocking: Outcome) -> Self {
        Self {
            stream: Some(script),
            ..Self::blocking_only(blocking)
        }
    }

    pub fn blocking_calls(&self) -> usize {
        self.blocking_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

async fn settle(outcome: &Outcome, name: &str, text: String) -> Result<String> {
    match outcome {
        Outcome::Text(_) if text.is_empty() => Err(Error::MalformedResponse {
            provider: name.into(),
            reason: "no content".into(),
        }),
        Outcome::Text(_) => Ok(text),
        Outcome::Transport(message) => Err(Error::Transport {
            provider: name.into(),
            message: message.clone(),
        }),
        Outcome::Malformed(reason) => Err(Error::MalformedResponse {
            provider: name.into(),
            reason: reason.clone(),
        }),
        Outcome::Hang => std::future::pending().await,
    }
}

#[async_trait]
impl CommitClient for FakeClient {
    async fn generate_commit_message(
        &self,
        _prompt: &str,
        _cancel: CancellationToken,
    ) -> Result<String> {
        self.blocking_calls.fetch_add(1, Ordering::SeqCst);
        let text = match &self.blocking {
            Outcome::Text(text) => text.clone(),
            _ => String::new(),
        };
        settle(&self.blocking, &self.name, text).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_streaming(&self) -> Option<&dyn StreamingClient> {
        self.stream.as_ref().map(|_| self as &dyn StreamingClient)
    }
}

#[async_trait]
impl StreamingClient for FakeClient {
    async fn stream_commit_message(
        &self,
        _prompt: &str,
        on_delta: &mut DeltaSink<'_>,
        _cancel: CancellationToken,
    ) -> Result<String> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let Some(script) = &self.stream else {
            return Err(Error::Transport {
                provider: self.name.clone(),
                message: "not scripted".into(),
            });
        };

        let mut full = String::new();
        // Empty fragments go out as scripted; filtering them is the caller's job.
        for delta in &script.deltas {
            tokio::task::yield_now().await;
            on_delta(delta);
            full.push_str(delta);
        }
        settle(&script.end, &self.name, full).await
    }
}
