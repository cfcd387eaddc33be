//! OpenAI-style `/v1/completions` client over a shared reqwest connection pool.

use std::time::{Duration, Instant};

use bench_common::config::BenchConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{elapsed_ms, CompletionBackend, Outcome};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl HttpCompletionClient {
    /// `client` is cloned cheaply; all clones share one connection pool.
    pub fn new(client: Client, base_url: &str, model: impl Into<String>) -> Self {
        let endpoint = format!("{}/v1/completions", base_url.trim_end_matches('/'));
        Self {
            client,
            endpoint,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(client: Client, base_url: &str, cfg: &BenchConfig) -> Self {
        Self::new(client, base_url, cfg.model.clone())
            .with_temperature(cfg.temperature)
            .with_timeout(Duration::from_secs(cfg.request_timeout_secs))
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Outcome {
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
            temperature: self.temperature,
        };
        let start = Instant::now();
        let resp = match self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(target: "client", error = %e, "completion request failed");
                return Outcome::failure(elapsed_ms(start), e.to_string());
            }
        };
        let status = resp.status();
        let payload = resp.bytes().await;
        let latency_ms = elapsed_ms(start);

        // A non-200 reply is reported by its status even if the body is cut short.
        if status != StatusCode::OK {
            tracing::debug!(target: "client", status = status.as_u16(), "non-200 completion response");
            let detail = match payload {
                Ok(_) => format!("HTTP {}", status.as_u16()),
                Err(e) => format!("HTTP {} ({})", status.as_u16(), e),
            };
            return Outcome::failure(latency_ms, detail);
        }
        let bytes = match payload {
            Ok(b) => b,
            Err(e) => return Outcome::failure(latency_ms, e.to_string()),
        };

        match serde_json::from_slice::<CompletionResponse>(&bytes) {
            Ok(parsed) => match parsed.choices.into_iter().next() {
                Some(choice) => Outcome::success(latency_ms, choice.text),
                None => Outcome::failure(latency_ms, "completion response contained no choices"),
            },
            Err(e) => Outcome::failure(latency_ms, format!("invalid completion response: {}", e)),
        }
    }
}
