// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::lines::LineBuffer;
use super::registry::missing_credential;
use super::{
    ClientSettings, CommitClient, DeltaSink, SYSTEM_PROMPT, StreamingClient, cancellable,
    http_client,
};
use crate::error::{Error, Result};

pub const NAME: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiProvider {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_ref()
            .ok_or_else(|| missing_credential(NAME))?;

        Ok(Self {
            client: http_client(settings)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: SecretString::from(api_key.expose_secret().to_owned()),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&ChatRequest {
                model: &self.model,
                messages: [
                    Message {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    Message {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                stream,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::transport(NAME, "request timed out")
                } else {
                    Error::transport(NAME, e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(NAME, format!("HTTP {status}: {body}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl CommitClient for OpenAiProvider {
    async fn generate_commit_message(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String> {
        cancellable(&cancel, async {
            let response = self.send(prompt, false).await?;
            let body = response
                .text()
                .await
                .map_err(|e| Error::transport(NAME, e))?;
            let parsed: ChatResponse =
                serde_json::from_str(&body).map_err(|e| Error::malformed(NAME, e))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| Error::malformed(NAME, "response has no message content"))
        })
        .await
    }

    fn name(&self) -> &str {
        NAME
    }

    fn as_streaming(&self) -> Option<&dyn StreamingClient> {
        Some(self)
    }
}

#[async_trait]
impl StreamingClient for OpenAiProvider {
    async fn stream_commit_message(
        &self,
        prompt: &str,
        on_delta: &mut DeltaSink<'_>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let response = cancellable(&cancel, self.send(prompt, true)).await?;

        let mut stream = response.bytes_stream();
        let mut full_response = String::new();
        let mut lines = LineBuffer::default();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else { break };
                    let chunk = chunk.map_err(|e| Error::transport(NAME, e))?;
                    lines.push(&chunk);

                    while let Some(line) = lines.next_line() {
                        if handle_line(&line, on_delta, &mut full_response)? {
                            return finish(full_response);
                        }
                    }
                }
            }
        }

        if let Some(rest) = lines.finish() {
            handle_line(&rest, on_delta, &mut full_response)?;
        }

        finish(full_response)
    }
}

/// Returns `true` on `[DONE]` or a finish reason.
fn handle_line(
    line: &str,
    on_delta: &mut DeltaSink<'_>,
    full_response: &mut String,
) -> Result<bool> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(false);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(true);
    }

    let Ok(chunk) = serde_json::from_str::<ChatChunk>(data) else {
        return Ok(false);
    };

    if let Some(error) = chunk.error {
        return Err(Error::transport(NAME, error.message));
    }

    let mut finished = false;
    for choice in chunk.choices {
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            on_delta(&content);
            full_response.push_str(&content);
        }
        finished |= choice.finish_reason.is_some();
    }

    Ok(finished)
}

fn finish(full_response: String) -> Result<String> {
    if full_response.is_empty() {
        return Err(Error::malformed(NAME, "stream ended without content"));
    }
    Ok(full_response)
}
