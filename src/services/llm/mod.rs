// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use std::future::Future;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

pub mod anthropic;
mod lines;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod stream;

pub use registry::{ProviderFactory, ProviderRegistry, ProviderSettings};
pub use stream::{Delivery, Generation, GenerationState, StreamingOrchestrator};

use crate::error::{Error, Result};

pub(crate) const SYSTEM_PROMPT: &str = r#"You are a commit message generator. Analyze git diffs and write Conventional Commits messages.

RULES:
1. Read the diff carefully - describe the ACTUAL changes you see
2. The subject must be SPECIFIC - mention what was added/changed/fixed
3. Format: type(scope): subject, optionally followed by a blank line and a body
4. Start subject with lowercase verb: add, fix, update, remove, refactor
5. Output ONLY the commit message, no commentary

BAD: "describe what changed" or "update code"
GOOD: "add rate limiting to api endpoints" or "fix null check in user service""#;

/// Callback receiving streamed fragments, in generation order.
pub type DeltaSink<'a> = dyn FnMut(&str) + Send + 'a;

/// Fully resolved settings handed to a provider factory.
#[derive(Debug)]
pub struct ClientSettings {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Blocking generation. Every adapter implements this.
///
/// One call in flight per client; callers wanting concurrency build one
/// client per operation.
#[async_trait]
pub trait CommitClient: Send + Sync {
    async fn generate_commit_message(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String>;

    fn name(&self) -> &str;

    /// Capability probe for incremental delivery.
    fn as_streaming(&self) -> Option<&dyn StreamingClient> {
        None
    }
}

/// Incremental generation, optional.
///
/// `on_delta` runs on the calling task, once per non-empty fragment. The
/// returned text is the exact concatenation of every delivered fragment.
#[async_trait]
pub trait StreamingClient: Send + Sync {
    async fn stream_commit_message(
        &self,
        prompt: &str,
        on_delta: &mut DeltaSink<'_>,
        cancel: CancellationToken,
    ) -> Result<String>;
}

/// Race `fut` against `cancel`. The losing future is dropped, which aborts
/// any request it had in flight.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

pub(crate) fn http_client(settings: &ClientSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| Error::transport(&settings.provider, e))
}

/// Bootstrap the built-in adapters. Safe to call more than once.
pub fn register_builtin_providers(registry: &ProviderRegistry) {
    registry.register_defaults(
        ollama::NAME,
        ProviderSettings {
            default_model: ollama::DEFAULT_MODEL.into(),
            default_base_url: ollama::DEFAULT_BASE_URL.into(),
            requires_api_key: false,
        },
    );
    registry.register(ollama::NAME, |settings: &ClientSettings| {
        Ok(Box::new(ollama::OllamaProvider::new(settings)?) as Box<dyn CommitClient>)
    });

    registry.register_defaults(
        openai::NAME,
        ProviderSettings {
            default_model: openai::DEFAULT_MODEL.into(),
            default_base_url: openai::DEFAULT_BASE_URL.into(),
            requires_api_key: true,
        },
    );
    registry.register(openai::NAME, |settings: &ClientSettings| {
        Ok(Box::new(openai::OpenAiProvider::new(settings)?) as Box<dyn CommitClient>)
    });

    registry.register_defaults(
        anthropic::NAME,
        ProviderSettings {
            default_model: anthropic::DEFAULT_MODEL.into(),
            default_base_url: anthropic::DEFAULT_BASE_URL.into(),
            requires_api_key: true,
        },
    );
    registry.register(anthropic::NAME, |settings: &ClientSettings| {
        Ok(Box::new(anthropic::AnthropicProvider::new(settings)?) as Box<dyn CommitClient>)
    });
}
