//! Completion client.
//!
//! The single chokepoint through which every LLM call passes. Enforces a
//! minimum spacing between consecutive calls and retries rate-limited
//! requests with exponential backoff under a fixed attempt budget. Any
//! non-rate-limit failure surfaces immediately; the pipeline has no fallback
//! path if the completion service is unreachable.

use crate::config::{CompletionBackend, LlmConfig};
use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::warn;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Outcome of one completion attempt.
enum CallOutcome {
    Success(String),
    RateLimited(String),
    Failed(ChatError),
}

pub struct CompletionClient {
    backend: CompletionBackend,
    client: reqwest::Client,
    min_interval: Duration,
    max_retries: u32,
    last_call: Mutex<Option<Instant>>,
}

impl CompletionClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            backend: config.backend,
            client: reqwest::Client::new(),
            min_interval: config.rate_limit_delay,
            max_retries: config.max_retries,
            last_call: Mutex::new(None),
        }
    }

    /// Submit a prompt and return the raw completion text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let backoff = backoff_delay(self.min_interval, attempt);
                warn!(
                    "Rate limited, backing off {:?} before attempt {} of {}",
                    backoff, attempt, self.max_retries
                );
                sleep(backoff).await;
            }

            self.pace().await;

            match self.dispatch(prompt).await {
                CallOutcome::Success(text) => return Ok(text),
                CallOutcome::RateLimited(detail) => {
                    warn!(
                        "Completion service rate limited on attempt {} of {}: {}",
                        attempt, self.max_retries, detail
                    );
                }
                CallOutcome::Failed(err) => return Err(err),
            }
        }

        Err(ChatError::RateLimitExhausted(self.max_retries))
    }

    /// Block until the minimum spacing since the previous call is satisfied.
    /// Holding the lock across the sleep serializes concurrent callers, so a
    /// shared client throttles all pipelines using it.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn dispatch(&self, prompt: &str) -> CallOutcome {
        match &self.backend {
            CompletionBackend::Gemini { api_key, model } => {
                self.dispatch_gemini(api_key, model, prompt).await
            }
            CompletionBackend::Ollama { base_url, model } => {
                self.dispatch_ollama(base_url, model, prompt).await
            }
        }
    }

    async fn dispatch_gemini(&self, api_key: &str, model: &str, prompt: &str) -> CallOutcome {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            GEMINI_ENDPOINT, model, api_key
        );
        let body = json!({
            "contents": [
                {
                    "parts": [
                        {"text": prompt}
                    ]
                }
            ]
        });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                return CallOutcome::Failed(ChatError::Completion(format!(
                    "request failed: {}",
                    e
                )))
            }
        };

        match classify_status(response.status()) {
            StatusClass::RateLimited => {
                return CallOutcome::RateLimited(format!("HTTP {}", response.status()))
            }
            StatusClass::Failed => {
                return CallOutcome::Failed(ChatError::Completion(format!(
                    "API request failed with status {}",
                    response.status()
                )))
            }
            StatusClass::Ok => {}
        }

        let payload: serde_json::Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                return CallOutcome::Failed(ChatError::Completion(format!(
                    "failed to decode response body: {}",
                    e
                )))
            }
        };

        match payload["candidates"][0]["content"]["parts"][0]["text"].as_str() {
            Some(text) => CallOutcome::Success(text.to_string()),
            None => CallOutcome::Failed(ChatError::Completion(
                "no completion text in response".to_string(),
            )),
        }
    }

    async fn dispatch_ollama(&self, base_url: &str, model: &str, prompt: &str) -> CallOutcome {
        let url = format!("{}/api/generate", base_url);
        let request = OllamaRequest {
            model,
            prompt,
            stream: false,
            options: Some(OllamaOptions {
                num_predict: Some(4096),
                temperature: Some(0.1),
            }),
        };

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                return CallOutcome::Failed(ChatError::Completion(format!(
                    "request failed: {}",
                    e
                )))
            }
        };

        match classify_status(response.status()) {
            StatusClass::RateLimited => {
                return CallOutcome::RateLimited(format!("HTTP {}", response.status()))
            }
            StatusClass::Failed => {
                return CallOutcome::Failed(ChatError::Completion(format!(
                    "API request failed with status {}",
                    response.status()
                )))
            }
            StatusClass::Ok => {}
        }

        match response.json::<OllamaResponse>().await {
            Ok(payload) => CallOutcome::Success(payload.response),
            Err(e) => CallOutcome::Failed(ChatError::Completion(format!(
                "failed to decode response body: {}",
                e
            ))),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum StatusClass {
    Ok,
    RateLimited,
    Failed,
}

/// Only HTTP 429 is transient; every other non-success status is terminal.
fn classify_status(status: reqwest::StatusCode) -> StatusClass {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        StatusClass::RateLimited
    } else if status.is_success() {
        StatusClass::Ok
    } else {
        StatusClass::Failed
    }
}

/// Backoff before retry `attempt` (attempt 2 waits 2x the base spacing,
/// attempt 3 waits 4x, ...).
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP stub that answers every request with a fixed status and
    /// body, counting the requests it serves.
    async fn spawn_stub(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => break,
                };
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let mut buf = [0u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn test_client(base_url: String) -> CompletionClient {
        let config = LlmConfig::new(CompletionBackend::Ollama {
            base_url,
            model: "test".to_string(),
        })
        .with_rate_limit_delay(Duration::from_millis(5))
        .with_max_retries(3);
        CompletionClient::new(config)
    }

    #[tokio::test]
    async fn test_success_returns_completion_text() {
        let (url, hits) = spawn_stub("200 OK", r#"{"response":"hello","done":true}"#).await;
        let client = test_client(url);
        let text = client.complete("hi").await.unwrap();
        assert_eq!(text, "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sustained_rate_limit_exhausts_budget() {
        let (url, hits) = spawn_stub("429 Too Many Requests", "{}").await;
        let client = test_client(url);
        match client.complete("hi").await {
            Err(ChatError::RateLimitExhausted(attempts)) => assert_eq!(attempts, 3),
            other => panic!("expected RateLimitExhausted, got {:?}", other.map(|_| ())),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_rate_limit_failure_does_not_retry() {
        let (url, hits) = spawn_stub("500 Internal Server Error", "{}").await;
        let client = test_client(url);
        match client.complete("hi").await {
            Err(ChatError::Completion(_)) => {}
            other => panic!("expected Completion error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_minimum_spacing_between_calls() {
        let (url, _) = spawn_stub("200 OK", r#"{"response":"ok","done":true}"#).await;
        let config = LlmConfig::new(CompletionBackend::Ollama {
            base_url: url,
            model: "test".to_string(),
        })
        .with_rate_limit_delay(Duration::from_millis(80));
        let client = CompletionClient::new(config);

        let start = Instant::now();
        client.complete("one").await.unwrap();
        client.complete("two").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 4), Duration::from_secs(8));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            StatusClass::RateLimited
        );
        assert_eq!(classify_status(reqwest::StatusCode::OK), StatusClass::Ok);
        assert_eq!(
            classify_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            StatusClass::Failed
        );
        assert_eq!(
            classify_status(reqwest::StatusCode::UNAUTHORIZED),
            StatusClass::Failed
        );
    }
}
