//! Vision narrator collaborator.
//!
//! Given a chart image and a role-aware prompt, an external multi-modal
//! model returns free-text commentary. The shipped implementation talks to a
//! local Ollama server and walks an ordered list of candidate models, taking
//! the first one that returns any non-empty text. Failures from earlier
//! candidates are logged and skipped; only the terminal outcome surfaces.

pub mod prompts;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// What the pipeline hands to the narrator: a prompt, optionally the encoded
/// chart image, and a generation cap.
#[derive(Debug, Clone)]
pub struct NarrationRequest {
    pub prompt: String,
    /// Encoded PNG/JPEG bytes of the chart; `None` for text-only synthesis.
    pub image: Option<Vec<u8>>,
    /// Output token cap forwarded as `num_predict`.
    pub max_tokens: u32,
}

/// Terminal narrator outcomes the caller can distinguish.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("no candidate models configured")]
    NoCandidates,
    #[error("all candidate models declined ({candidates})")]
    AllDeclined { candidates: String },
}

#[async_trait]
pub trait VisionNarrator: Send + Sync {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String, NarratorError>;
}

#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub base_url: String,
    /// Candidate models tried in order; first non-empty response wins.
    pub models: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            models: vec![
                "llava:7b".to_string(),
                "llava-phi".to_string(),
                "mistral".to_string(),
            ],
            // Local vision inference on modest hardware is slow; give a
            // single generation plenty of room.
            request_timeout: Duration::from_secs(180),
        }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

/// Ollama-backed narrator.
pub struct OllamaNarrator {
    config: NarratorConfig,
    client: reqwest::Client,
}

impl OllamaNarrator {
    pub fn new(config: NarratorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build reqwest client");
        Self { config, client }
    }

    /// One generation attempt against one model. `Ok(None)` means the model
    /// answered but produced nothing usable.
    async fn generate(
        &self,
        model: &str,
        request: &NarrationRequest,
    ) -> reqwest::Result<Option<String>> {
        let images = request
            .image
            .as_ref()
            .map(|bytes| vec![base64::engine::general_purpose::STANDARD.encode(bytes)]);

        let body = GenerateBody {
            model,
            prompt: &request.prompt,
            images,
            stream: false,
            options: GenerateOptions {
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        if response.response.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(response.response))
        }
    }

    /// List the model names the server has pulled. Used by the environment
    /// check, not by the narration path.
    pub async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        use anyhow::Context as _;
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .context("Ollama tags endpoint returned an error status")?
            .json::<TagsResponse>()
            .await
            .context("failed to decode Ollama tags response")?;
        Ok(response.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl VisionNarrator for OllamaNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String, NarratorError> {
        if self.config.models.is_empty() {
            return Err(NarratorError::NoCandidates);
        }

        for model in &self.config.models {
            match self.generate(model, request).await {
                Ok(Some(text)) => {
                    log::info!("narration produced by model {model}");
                    return Ok(text);
                }
                Ok(None) => {
                    log::warn!("model {model} returned empty text, trying next candidate");
                }
                Err(err) => {
                    log::warn!("model {model} failed ({err}), trying next candidate");
                }
            }
        }

        Err(NarratorError::AllDeclined {
            candidates: self.config.models.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_candidate_list_fails_without_any_request() {
        // Point at an unroutable port: if the narrator tried the network at
        // all, the error would be AllDeclined instead.
        let narrator = OllamaNarrator::new(NarratorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            models: Vec::new(),
            request_timeout: Duration::from_millis(50),
        });
        let request = NarrationRequest {
            prompt: "anything".into(),
            image: None,
            max_tokens: 10,
        };
        assert!(matches!(
            narrator.narrate(&request).await,
            Err(NarratorError::NoCandidates)
        ));
    }

    #[tokio::test]
    async fn unreachable_server_reports_all_declined() {
        let narrator = OllamaNarrator::new(NarratorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            models: vec!["llava:7b".into(), "mistral".into()],
            request_timeout: Duration::from_millis(50),
        });
        let request = NarrationRequest {
            prompt: "anything".into(),
            image: None,
            max_tokens: 10,
        };
        match narrator.narrate(&request).await {
            Err(NarratorError::AllDeclined { candidates }) => {
                assert!(candidates.contains("llava:7b"));
                assert!(candidates.contains("mistral"));
            }
            other => panic!("expected AllDeclined, got {other:?}"),
        }
    }
}
