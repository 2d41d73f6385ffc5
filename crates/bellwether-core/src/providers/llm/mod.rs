use crate::errors::BackendError;
use crate::model::{BackendConfig, BackendKind};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Lazy, finite, non-restartable sequence of text fragments whose
/// concatenation is the full response.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationRequest {
    pub fn from_config(cfg: &BackendConfig, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
        }
    }
}

/// Backend client capability. The harness and selector depend only on this
/// trait, never on concrete client types.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, req: &GenerationRequest) -> Result<String, BackendError>;

    /// Streaming variant. Clients without native streaming fall back to a
    /// single-fragment stream over the full response.
    async fn generate_stream(&self, req: &GenerationRequest) -> Result<TextStream, BackendError> {
        let text = self.generate(req).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    fn provider_name(&self) -> &'static str;
}

/// Build the client for a backend's configured kind.
pub fn build_client(cfg: &BackendConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    let api_key = cfg.api_key.clone().unwrap_or_default();
    Ok(match cfg.kind {
        BackendKind::Openai => Arc::new(openai::OpenAiClient::new(
            cfg.model_name.clone(),
            api_key,
            cfg.base_url.clone(),
        )),
        BackendKind::Anthropic => Arc::new(anthropic::AnthropicClient::new(
            cfg.model_name.clone(),
            api_key,
            cfg.base_url.clone(),
        )),
        BackendKind::Google => Arc::new(google::GoogleClient::new(
            cfg.model_name.clone(),
            api_key,
            cfg.base_url.clone(),
        )),
    })
}

pub mod anthropic;
pub mod fake;
pub mod google;
pub mod openai;
