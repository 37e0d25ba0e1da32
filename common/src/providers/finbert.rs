use serde::{Deserialize, Serialize};
use reqwest::Client;
use std::time::Duration;
use crate::error::AgentError;

/// Financial-news sentiment model served by the Hugging Face inference API.
pub const FINBERT: &str = "ProsusAI/finbert";

const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FinBertClient {
    client: Client,
    base_url: String,
    model: String,
    api_token: String,
}

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// The inference API answers with one list per input, a flat list, or an
/// error object while the model is loading.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Error { error: String },
}

impl FinBertClient {
    pub fn new(api_token: &str) -> Result<Self, AgentError> {
        Self::with_timeout(api_token, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_token: &str, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::ExternalApiError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: HF_INFERENCE_BASE.to_string(),
            model: FINBERT.to_string(),
            api_token: api_token.to_string(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns every label the model scored, highest first.
    pub async fn scores(&self, text: &str) -> Result<Vec<LabelScore>, AgentError> {
        let response = self.client
            .post(&format!("{}/{}", self.base_url, self.model))
            .bearer_auth(&self.api_token)
            .json(&ClassificationRequest { inputs: text })
            .send()
            .await
            .map_err(|e| AgentError::ExternalApiError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::ExternalApiError(e.to_string()))?;

        let parsed = serde_json::from_str::<ClassificationResponse>(&body)
            .map_err(|e| AgentError::ParseError(format!("{e}: {body}")))?;

        let mut scores = match parsed {
            ClassificationResponse::Error { error } => {
                return Err(AgentError::ExternalApiError(format!("{status}: {error}")));
            },
            ClassificationResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    Vec::new()
                } else {
                    batches.swap_remove(0)
                }
            },
            ClassificationResponse::Flat(scores) => scores,
        };

        if !status.is_success() {
            return Err(AgentError::ExternalApiError(format!("inference API returned {status}")));
        }

        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores)
    }

    /// The single most likely label.
    pub async fn classify(&self, text: &str) -> Result<LabelScore, AgentError> {
        self.scores(text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ParseError("inference API returned no labels".to_string()))
    }
}
