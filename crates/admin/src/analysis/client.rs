//! Chat-completion client used for the narrative analysis.

use std::sync::Arc;

use kennel_core::BusinessMetrics;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use super::error::AnalysisError;
use super::prompt::RenderedPrompt;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::AnalysisConfig;

/// Returned when the endpoint answers successfully but without any text.
pub const FALLBACK_ANALYSIS: &str = "No analysis was returned. Please try again later.";
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Analysis API client.
///
/// Talks to any OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct AnalysisClient {
    inner: Arc<AnalysisClientInner>,
}

struct AnalysisClientInner {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl AnalysisClient {
    /// Create a new analysis client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value, the URL
    /// cannot be extended, or the HTTP client fails to build.
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let bearer = format!("Bearer {}", config.api_key.expose_secret());

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| AnalysisError::Parse(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AnalysisClientInner {
                client,
                endpoint: completions_endpoint(&config.api_url)?,
                model: config.model.clone(),
            }),
        })
    }

    /// Ask the advisor for a narrative analysis of `metrics`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be rendered or the request
    /// fails.
    #[instrument(skip_all, fields(model = %self.inner.model, as_of = %metrics.generated_on))]
    pub async fn analyze(&self, metrics: &BusinessMetrics) -> Result<String, AnalysisError> {
        let prompt = RenderedPrompt::render(metrics)?;
        self.complete(prompt.system, prompt.user).await
    }

    /// Send one system and one user message, return the first completion's
    /// text or [`FALLBACK_ANALYSIS`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Api`] with the status and body for any
    /// non-success status, and [`AnalysisError::Http`] for transport errors.
    #[instrument(skip_all, fields(model = %self.inner.model))]
    pub async fn complete(&self, system: String, user: String) -> Result<String, AnalysisError> {
        let request = ChatCompletionRequest {
            model: self.inner.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Analysis request failed");
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::Parse(format!("Failed to parse response: {e}")))?;
        Ok(parsed.into_text().unwrap_or_else(|| {
            tracing::info!("Analysis response carried no text, using fallback");
            FALLBACK_ANALYSIS.to_string()
        }))
    }
}

fn completions_endpoint(base: &Url) -> Result<Url, AnalysisError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|e| AnalysisError::Parse(format!("Invalid analysis API URL: {e}")))
}
