use crate::circuit::CircuitBreaker;
use crate::config::SemanticConfig;
use crate::errors::{ServiceError, ServiceResult};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use vpa_risk_engine::semantic::{build_prompt, parse_judgment};
use vpa_risk_engine::{SemanticOracle, SemanticOutcome};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Semantic oracle backed by an OpenAI-compatible chat-completions endpoint
pub struct LlmSemanticOracle {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    breaker: Arc<CircuitBreaker>,
}

impl LlmSemanticOracle {
    pub fn new(config: &SemanticConfig, breaker: Arc<CircuitBreaker>) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ServiceError::ConfigurationError(format!("HTTP client: {}", e)))?;

        Ok(LlmSemanticOracle {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            breaker,
        })
    }

    async fn request_completion(&self, api_key: &str, receiver_vpa: &str) -> Result<ChatResponse, String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(receiver_vpa),
            }],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("endpoint returned {}", status));
        }

        response.json::<ChatResponse>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SemanticOracle for LlmSemanticOracle {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn assess(&self, receiver_vpa: &str) -> SemanticOutcome {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return SemanticOutcome::Unavailable,
        };

        if !self.breaker.allow_request().await {
            metrics::record_oracle("semantic", "circuit_open");
            return SemanticOutcome::Unavailable;
        }

        let response = match self.request_completion(api_key, receiver_vpa).await {
            Ok(response) => {
                self.breaker.on_success().await;
                response
            }
            Err(e) => {
                warn!(error = %e, "Semantic endpoint call failed");
                self.breaker.on_failure().await;
                metrics::record_oracle("semantic", "unavailable");
                return SemanticOutcome::Unavailable;
            }
        };

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        let outcome = match content {
            Some(text) => parse_judgment(&text),
            None => {
                debug!("Semantic response carried no message content");
                SemanticOutcome::Malformed
            }
        };

        let label = match &outcome {
            SemanticOutcome::Assessed(_) => "assessed",
            SemanticOutcome::Unavailable => "unavailable",
            SemanticOutcome::Malformed => "malformed",
        };
        metrics::record_oracle("semantic", label);
        outcome
    }
}
