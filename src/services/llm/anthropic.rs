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

pub const NAME: &str = "anthropic";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [Message<'a>; 1],
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
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<ContentDelta>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ContentDelta {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl AnthropicProvider {
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
        let url = format!("{}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&MessagesRequest {
                model: &self.model,
                system: SYSTEM_PROMPT,
                messages: [Message {
                    role: "user",
                    content: prompt,
                }],
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
impl CommitClient for AnthropicProvider {
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
            let parsed: MessagesResponse =
                serde_json::from_str(&body).map_err(|e| Error::malformed(NAME, e))?;

            let text: String = parsed
                .content
                .into_iter()
                .filter(|block| block.block_type == "text")
                .filter_map(|block| block.text)
                .collect();
            Ok(text)
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
impl StreamingClient for AnthropicProvider {
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

/// SSE: `event: <type>` lines are redundant with the JSON `type` field.
/// Returns `true` on `message_stop`.
fn handle_line(
    line: &str,
    on_delta: &mut DeltaSink<'_>,
    full_response: &mut String,
) -> Result<bool> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(false);
    };

    let Ok(event) = serde_json::from_str::<StreamEvent>(data.trim_start()) else {
        return Ok(false);
    };

    match event.event_type.as_str() {
        "content_block_delta" => {
            if let Some(text) = event
                .delta
                .and_then(|delta| delta.text)
                .filter(|text| !text.is_empty())
            {
                on_delta(&text);
                full_response.push_str(&text);
            }
            Ok(false)
        }
        "message_stop" => Ok(true),
        "error" => {
            let message = event
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "stream error".into());
            Err(Error::transport(NAME, message))
        }
        _ => Ok(false),
    }
}

fn finish(full_response: String) -> Result<String> {
    if full_response.is_empty() {
        return Err(Error::malformed(NAME, "stream ended without content"));
    }
    Ok(full_response)
}
