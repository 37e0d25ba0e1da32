use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

/// Scores strictly above this are positive; strictly below its negation are negative.
pub const NEUTRAL_BAND: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub symbol: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl Article {
    /// Text handed to the classifier.
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Fixed bucketing used everywhere a score is turned into a label.
    pub fn bucket(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            SentimentLabel::Positive
        } else if score < -NEUTRAL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Maps a raw model label onto the three buckets.
    pub fn from_model_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("positive") || label.contains("bullish") {
            SentimentLabel::Positive
        } else if label.contains("negative") || label.contains("bearish") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClassificationStatus {
    Classified,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment_score: f64,
    pub confidence: f64,
    pub label: SentimentLabel,
    pub status: ClassificationStatus,
}

impl Classification {
    /// Neutral, zero-confidence result recorded when the model could not be reached.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            sentiment_score: 0.0,
            confidence: 0.0,
            label: SentimentLabel::Neutral,
            status: ClassificationStatus::Fallback { reason: reason.into() },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, ClassificationStatus::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub sentiment_score: f64,
    pub confidence: f64,
    pub label: SentimentLabel,
    pub status: ClassificationStatus,
}

impl ScoredArticle {
    pub fn new(article: Article, classification: Classification) -> Self {
        Self {
            article,
            sentiment_score: classification.sentiment_score,
            confidence: classification.confidence,
            label: classification.label,
            status: classification.status,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.article.symbol
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, ClassificationStatus::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub symbol: String,
    pub avg_sentiment: f64,
    pub total_articles: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    #[serde(default)]
    pub failed_classifications: usize,
    #[serde(default)]
    pub latest_articles: Vec<ScoredArticle>,
}

impl SentimentSummary {
    /// Summary for a symbol with no news.
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            avg_sentiment: 0.0,
            total_articles: 0,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            failed_classifications: 0,
            latest_articles: Vec::new(),
        }
    }

    pub fn tone(&self) -> SentimentLabel {
        SentimentLabel::bucket(self.avg_sentiment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedStatus {
    Ok,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSentiment {
    pub summary: SentimentSummary,
    pub articles: Vec<ScoredArticle>,
    pub feed: FeedStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentBoard {
    pub symbols: Vec<SymbolSentiment>,
}

impl SentimentBoard {
    pub fn get(&self, symbol: &str) -> Option<&SymbolSentiment> {
        self.symbols.iter().find(|s| s.summary.symbol == symbol)
    }

    pub fn summaries(&self) -> Vec<SentimentSummary> {
        self.symbols.iter().map(|s| s.summary.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_pct: f64,
    pub volume: u64,
    pub market_cap: Option<f64>,
    pub history: Vec<PriceBar>,
}

impl MarketSnapshot {
    /// Derives price change figures from a daily history, oldest bar first.
    pub fn from_history(symbol: &str, history: Vec<PriceBar>, market_cap: Option<f64>) -> Option<Self> {
        let last = history.last()?;
        let current_price = last.close;
        let volume = last.volume;
        let previous_close = if history.len() > 1 {
            history[history.len() - 2].close
        } else {
            current_price
        };
        let change = current_price - previous_close;
        let change_pct = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        Some(Self {
            symbol: symbol.to_string(),
            current_price,
            previous_close,
            change,
            change_pct,
            volume,
            market_cap,
            history,
        })
    }

    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketBoard {
    pub snapshots: Vec<MarketSnapshot>,
    pub failures: Vec<SymbolFailure>,
}

impl MarketBoard {
    pub fn get(&self, symbol: &str) -> Option<&MarketSnapshot> {
        self.snapshots.iter().find(|s| s.symbol == symbol)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid ticker symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("NEWS_API_KEY is not configured")]
    MissingApiKey,

    #[error("News API rate limit hit while fetching {symbol}")]
    RateLimited { symbol: String },

    #[error("News API rejected the key while fetching {symbol}")]
    Unauthorized { symbol: String },

    #[error("News request for {symbol} failed: {reason}")]
    Request { symbol: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("Classifier backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("CLAUDE_API_KEY is not configured")]
    MissingApiKey,

    #[error("LLM request failed: {0}")]
    Api(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Failed to render prompt: {0}")]
    Prompt(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    #[error("Market data request for {symbol} failed: {reason}")]
    Api { symbol: String, reason: String },

    #[error("No price history returned for {0}")]
    NoData(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Market,
    Sentiment,
}

#[derive(Debug, thiserror::Error)]
#[error("no data available for {symbol}")]
pub struct MissingDataError {
    pub symbol: String,
    pub kind: DataKind,
}
