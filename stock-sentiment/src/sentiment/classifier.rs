use async_trait::async_trait;
use common::providers::FinBertClient;
use tracing::{debug, warn};

use crate::models::{Classification, ClassificationError, ClassificationStatus, SentimentLabel};
use super::lexicon::FinancialLexicon;

/// Longest text (in characters) sent to a model.
pub const MAX_INPUT_CHARS: usize = 512;

/// Raw output of a classification model: its own label and a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn predict(&self, text: &str) -> Result<Prediction, ClassificationError>;
}

pub struct FinBertBackend {
    client: FinBertClient,
}

impl FinBertBackend {
    pub fn new(client: FinBertClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ModelBackend for FinBertBackend {
    fn name(&self) -> &str {
        self.client.model()
    }

    async fn predict(&self, text: &str) -> Result<Prediction, ClassificationError> {
        let best = self.client
            .classify(text)
            .await
            .map_err(|e| ClassificationError::Backend(e.to_string()))?;
        Ok(Prediction { label: best.label, score: best.score })
    }
}

/// VADER's conventional cut-off between neutral and polar compound scores.
const LEXICON_NEUTRAL_BAND: f64 = 0.05;

pub struct LexiconBackend {
    lexicon: FinancialLexicon,
}

impl LexiconBackend {
    pub fn new() -> Self {
        Self { lexicon: FinancialLexicon::new() }
    }
}

impl Default for LexiconBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelBackend for LexiconBackend {
    fn name(&self) -> &str {
        "financial-lexicon"
    }

    async fn predict(&self, text: &str) -> Result<Prediction, ClassificationError> {
        let score = self.lexicon.score(text);
        let label = match score {
            s if s >= LEXICON_NEUTRAL_BAND => "positive",
            s if s <= -LEXICON_NEUTRAL_BAND => "negative",
            _ => "neutral",
        };
        Ok(Prediction { label: label.to_string(), score: score.abs() })
    }
}

/// Turns model predictions into signed sentiment scores.
pub struct SentimentClassifier {
    backend: Box<dyn ModelBackend>,
}

impl SentimentClassifier {
    pub fn new(backend: Box<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Classifies `text`, reporting backend failures to the caller.
    pub async fn try_classify(&self, text: &str) -> Result<Classification, ClassificationError> {
        let input = truncate_chars(text, MAX_INPUT_CHARS);
        let prediction = self.backend.predict(input).await?;

        let confidence = if prediction.score.is_finite() {
            prediction.score.clamp(0.0, 1.0)
        } else {
            return Err(ClassificationError::Backend(format!(
                "non-finite confidence {} for label {:?}",
                prediction.score, prediction.label
            )));
        };

        let label = SentimentLabel::from_model_label(&prediction.label);
        let sentiment_score = match label {
            SentimentLabel::Positive => confidence,
            SentimentLabel::Negative => -confidence,
            SentimentLabel::Neutral => 0.0,
        };

        debug!(backend = self.backend.name(), label = %label, sentiment_score, "classified text");

        Ok(Classification {
            sentiment_score,
            confidence,
            label,
            status: ClassificationStatus::Classified,
        })
    }

    /// Classifies `text`; any failure becomes a neutral, zero-confidence result.
    pub async fn classify(&self, text: &str) -> Classification {
        match self.try_classify(text).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "sentiment classification failed, defaulting to neutral");
                Classification::fallback(e.to_string())
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
