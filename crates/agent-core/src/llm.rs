//! Minimal client for an Ollama-style `POST /api/generate` endpoint.
//!
//! Prompt in, completed text out, non-streaming. Model loading, tokenization,
//! and sampling are the inference server's business.

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:11434/api/generate`.
    pub endpoint: String,
    pub model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    cfg: OllamaConfig,
}

impl OllamaClient {
    pub fn new(cfg: OllamaConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    /// Sends a prompt and returns the raw response text.
    pub async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let request = GenerateRequest {
            model: self.cfg.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let res = self
            .http
            .post(&self.cfg.endpoint)
            .json(&request)
            .send()
            .await
            .context("ollama request failed")?
            .error_for_status()
            .context("ollama non-2xx response")?
            .json::<GenerateResponse>()
            .await
            .context("ollama response decode failed")?;

        Ok(res.response)
    }
}
