// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Streaming first, blocking as a fallback.
//!
//! ```text
//! Idle -> AttemptingStream -> Streaming  -> Done | Failed | Cancelled
//!                          \-> FallenBack -> Done | Failed | Cancelled
//! Streaming -(error, no delta yet)-> FallenBack
//! ```
//!
//! A streaming failure after at least one delta is surfaced as-is: retrying
//! would replay text the user has already seen. Cancellation never falls
//! back.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{CommitClient, DeltaSink, cancellable};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    AttemptingStream,
    Streaming,
    FallenBack,
    Done,
    Failed,
    Cancelled,
}

/// How the final text reached the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every fragment went through `on_delta`.
    Streamed,
    /// The client has no incremental capability, or streaming was disabled.
    Blocking,
    /// Streaming failed before its first delta; the blocking call answered.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub delivery: Delivery,
}

/// Drives one generation request. Reusable; each `run` starts from `Idle`.
#[derive(Debug)]
pub struct StreamingOrchestrator {
    state: GenerationState,
    prefer_streaming: bool,
}

impl Default for StreamingOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingOrchestrator {
    pub fn new() -> Self {
        Self {
            state: GenerationState::Idle,
            prefer_streaming: true,
        }
    }

    /// With `false`, incremental delivery is never attempted.
    pub fn prefer_streaming(mut self, prefer: bool) -> Self {
        self.prefer_streaming = prefer;
        self
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub async fn run(
        &mut self,
        client: &dyn CommitClient,
        prompt: &str,
        on_delta: &mut DeltaSink<'_>,
        cancel: CancellationToken,
    ) -> Result<Generation> {
        self.state = GenerationState::Idle;
        self.transition(GenerationState::AttemptingStream, client);

        if cancel.is_cancelled() {
            return self.finish(Err(Error::Cancelled), &cancel, Delivery::Blocking);
        }

        let streaming = client.as_streaming().filter(|_| self.prefer_streaming);
        let Some(streaming) = streaming else {
            self.transition(GenerationState::FallenBack, client);
            return self.blocking(client, prompt, cancel, Delivery::Blocking).await;
        };

        self.transition(GenerationState::Streaming, client);

        let mut delivered = 0usize;
        let outcome = {
            let mut forward = |delta: &str| {
                if delta.is_empty() {
                    return;
                }
                delivered += 1;
                on_delta(delta);
            };
            cancellable(
                &cancel,
                streaming.stream_commit_message(prompt, &mut forward, cancel.clone()),
            )
            .await
        };

        match outcome {
            Err(e) if delivered == 0 && !is_cancellation(&e, &cancel) => {
                debug!(
                    provider = client.name(),
                    error = %e,
                    "streaming failed before first delta, falling back"
                );
                self.transition(GenerationState::FallenBack, client);
                self.blocking(client, prompt, cancel, Delivery::Fallback)
                    .await
            }
            outcome => self.finish(outcome, &cancel, Delivery::Streamed),
        }
    }

    async fn blocking(
        &mut self,
        client: &dyn CommitClient,
        prompt: &str,
        cancel: CancellationToken,
        delivery: Delivery,
    ) -> Result<Generation> {
        let outcome = cancellable(
            &cancel,
            client.generate_commit_message(prompt, cancel.clone()),
        )
        .await;
        self.finish(outcome, &cancel, delivery)
    }

    fn finish(
        &mut self,
        outcome: Result<String>,
        cancel: &CancellationToken,
        delivery: Delivery,
    ) -> Result<Generation> {
        match outcome {
            Ok(text) => {
                self.state = GenerationState::Done;
                debug!(chars = text.len(), ?delivery, "generation done");
                Ok(Generation { text, delivery })
            }
            Err(e) if is_cancellation(&e, cancel) => {
                self.state = GenerationState::Cancelled;
                Err(Error::Cancelled)
            }
            Err(e) => {
                self.state = GenerationState::Failed;
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: GenerationState, client: &dyn CommitClient) {
        debug!(provider = client.name(), from = ?self.state, to = ?next, "generation state");
        self.state = next;
    }
}

/// An adapter may surface a raw I/O error when its request is torn down by
/// cancellation; the token is the source of truth.
fn is_cancellation(error: &Error, cancel: &CancellationToken) -> bool {
    matches!(error, Error::Cancelled) || cancel.is_cancelled()
}
