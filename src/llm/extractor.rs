use crate::error::{AdbError, Result};
use crate::ingestion::parse_extraction_json;
use crate::llm::client::GeminiClient;
use crate::llm::prompts::{response_schema, user_instructions, SYSTEM_PROMPT_STATEMENT};
use crate::llm::types::*;
use crate::schema::RawObservation;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::time::timeout;

/// Anything that can answer a generate-content request with raw text.
pub trait ExtractionBackend: Send + Sync {
    fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
    ) -> impl Future<Output = Result<String>> + Send;
}

impl ExtractionBackend for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String> {
        self.generate_content(model, system_prompt, messages, response_schema)
            .await
    }
}

/// Decides which models to try, in order, and when a failure moves on to the next one.
pub trait FallbackPolicy: Send + Sync {
    fn candidates(&self) -> Vec<String>;

    fn should_fall_back(&self, error: &AdbError) -> bool;
}

/// Tries each model in order until one returns parseable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFallback {
    models: Vec<String>,
}

impl ModelFallback {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }
}

impl Default for ModelFallback {
    fn default() -> Self {
        Self::new(ExtractorConfig::default().models)
    }
}

impl FallbackPolicy for ModelFallback {
    fn candidates(&self) -> Vec<String> {
        self.models.clone()
    }

    fn should_fall_back(&self, error: &AdbError) -> bool {
        // A local IO problem will not go away with another model.
        !matches!(error, AdbError::IoError(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub models: Vec<String>,
    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
            request_timeout_secs: 120,
            poll_interval_secs: 2,
        }
    }
}

impl ExtractorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

pub struct StatementExtractor<B = GeminiClient, P = ModelFallback> {
    backend: B,
    policy: P,
    request_timeout: Duration,
    system_prompt: String,
}

impl StatementExtractor<GeminiClient, ModelFallback> {
    pub fn from_config(api_key: String, config: &ExtractorConfig) -> Self {
        let client = GeminiClient::new(api_key).with_poll_interval(config.poll_interval());
        StatementExtractor::new(client, ModelFallback::new(config.models.clone()))
            .with_timeout(config.request_timeout())
    }
}

impl<B: ExtractionBackend, P: FallbackPolicy> StatementExtractor<B, P> {
    pub fn new(backend: B, policy: P) -> Self {
        Self {
            backend,
            policy,
            request_timeout: ExtractorConfig::default().request_timeout(),
            system_prompt: SYSTEM_PROMPT_STATEMENT.to_string(),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Allow the caller to load a bank-specific prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs the extraction, falling back through the policy's models.
    ///
    /// An `Ok` result is always a parsed observation list; transport and
    /// model errors never reach the engine.
    pub async fn extract(
        &self,
        document: &StatementDocument,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Vec<RawObservation>> {
        send_event(
            &progress,
            ExtractionEvent::Starting {
                document: document.display_name().to_string(),
            },
        )
        .await;

        let models = self.policy.candidates();
        if models.is_empty() {
            return Err(AdbError::ExtractionFailed(
                "No extraction models configured".to_string(),
            ));
        }

        let mut failures = Vec::new();
        for (attempt, model) in models.iter().enumerate() {
            send_event(
                &progress,
                ExtractionEvent::Attempting {
                    model: model.clone(),
                    attempt: attempt + 1,
                },
            )
            .await;

            match self.extract_with_model(model, document, &progress).await {
                Ok(observations) => {
                    info!(
                        "Extracted {} observations from {} with {}",
                        observations.len(),
                        document.display_name(),
                        model
                    );
                    send_event(
                        &progress,
                        ExtractionEvent::Success {
                            model: model.clone(),
                            observations: observations.len(),
                        },
                    )
                    .await;
                    return Ok(observations);
                }
                Err(e) if self.policy.should_fall_back(&e) => {
                    warn!("Extraction with {} failed: {}", model, e);
                    send_event(
                        &progress,
                        ExtractionEvent::FallingBack {
                            model: model.clone(),
                            error: e.to_string(),
                        },
                    )
                    .await;
                    failures.push(format!("{}: {}", model, e));
                }
                Err(e) => {
                    send_event(
                        &progress,
                        ExtractionEvent::Failed {
                            reason: e.to_string(),
                        },
                    )
                    .await;
                    return Err(e);
                }
            }
        }

        let reason = format!("All models failed. {}", failures.join("; "));
        send_event(
            &progress,
            ExtractionEvent::Failed {
                reason: reason.clone(),
            },
        )
        .await;
        Err(AdbError::ExtractionFailed(reason))
    }

    /// Extracts several statements concurrently. Each result is independent.
    pub async fn extract_many(
        &self,
        documents: &[StatementDocument],
    ) -> Vec<Result<Vec<RawObservation>>> {
        futures::future::join_all(documents.iter().map(|doc| self.extract(doc, None))).await
    }

    async fn extract_with_model(
        &self,
        model: &str,
        document: &StatementDocument,
        progress: &Option<Sender<ExtractionEvent>>,
    ) -> Result<Vec<RawObservation>> {
        let messages = vec![Content::user_with_document(
            user_instructions(document.display_name()),
            document,
        )];

        let request = self.backend.generate(
            model,
            &self.system_prompt,
            messages,
            Some(response_schema()),
        );

        let raw_text = timeout(self.request_timeout, request)
            .await
            .map_err(|_| AdbError::ExtractionTimeout {
                model: model.to_string(),
                seconds: self.request_timeout.as_secs(),
            })??;

        send_event(
            progress,
            ExtractionEvent::ProcessingResponse {
                model: model.to_string(),
            },
        )
        .await;

        parse_extraction_json(&raw_text)
    }
}

async fn send_event(sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event).await;
    }
}
