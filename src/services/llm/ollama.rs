// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::lines::LineBuffer;
use super::{
    ClientSettings, CommitClient, DeltaSink, SYSTEM_PROMPT, StreamingClient, cancellable,
    http_client,
};
use crate::error::{Error, Result};

pub const NAME: &str = "ollama";
pub const DEFAULT_MODEL: &str = "qwen3:4b";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: Client,
    host: String,
    model: String,
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

impl OllamaProvider {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings)?,
            // Sanitize: remove trailing slashes to avoid //api/generate
            host: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            num_predict: settings.max_tokens,
        })
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let url = format!("{}/api/generate", self.host);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                system: SYSTEM_PROMPT,
                prompt,
                stream,
                options: GenerateOptions {
                    temperature: self.temperature,
                    num_predict: self.num_predict,
                },
            })
            .send()
            .await
            .map_err(|e| Error::transport(NAME, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(NAME, format!("HTTP {status}: {body}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl CommitClient for OllamaProvider {
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
            let parsed: GenerateResponse =
                serde_json::from_str(&body).map_err(|e| Error::malformed(NAME, e))?;

            if let Some(error) = parsed.error {
                return Err(Error::transport(NAME, error));
            }
            Ok(parsed.response)
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
impl StreamingClient for OllamaProvider {
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
                    let Some(chunk) = chunk else {
                        break; // Stream ended
                    };
                    let chunk = chunk.map_err(|e| Error::transport(NAME, e))?;
                    lines.push(&chunk);

                    // Newline-delimited JSON
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

/// Returns `true` once the final frame has been seen.
fn handle_line(
    line: &str,
    on_delta: &mut DeltaSink<'_>,
    full_response: &mut String,
) -> Result<bool> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }

    let Ok(frame) = serde_json::from_str::<GenerateResponse>(line) else {
        return Ok(false);
    };

    if let Some(error) = frame.error {
        return Err(Error::transport(NAME, error));
    }

    if !frame.response.is_empty() {
        on_delta(&frame.response);
        full_response.push_str(&frame.response);
    }

    Ok(frame.done)
}

fn finish(full_response: String) -> Result<String> {
    if full_response.is_empty() {
        return Err(Error::malformed(NAME, "stream ended without content"));
    }
    Ok(full_response)
}
