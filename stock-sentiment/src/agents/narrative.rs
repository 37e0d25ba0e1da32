use async_trait::async_trait;
use common::providers::ClaudeClient;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::NarrativeConfig;
use crate::models::{ScoredArticle, SentimentLabel, SentimentSummary, SummarizationError};

pub const NO_NEWS_MESSAGE: &str = "No recent news found for this stock.";
pub const OVERVIEW_ERROR_MESSAGE: &str = "Error generating market overview";

/// A single-shot text completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u64) -> Result<String, SummarizationError>;
}

pub struct ClaudeBackend {
    client: ClaudeClient,
    model: String,
}

impl ClaudeBackend {
    pub fn new(client: ClaudeClient, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl CompletionBackend for ClaudeBackend {
    async fn complete(&self, prompt: &str, max_tokens: u64) -> Result<String, SummarizationError> {
        self.client
            .complete(&self.model, prompt, max_tokens)
            .await
            .map_err(|e| SummarizationError::Api(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct PromptArticle<'a> {
    title: &'a str,
    description: &'a str,
    sentiment_score: f64,
    source: &'a str,
    date: String,
}

impl<'a> From<&'a ScoredArticle> for PromptArticle<'a> {
    fn from(scored: &'a ScoredArticle) -> Self {
        Self {
            title: &scored.article.title,
            description: &scored.article.description,
            sentiment_score: round2(scored.sentiment_score),
            source: &scored.article.source,
            date: scored.article.published_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OverviewRow<'a> {
    symbol: &'a str,
    avg_sentiment: f64,
    total_articles: usize,
    positive_count: usize,
    negative_count: usize,
    neutral_count: usize,
}

impl<'a> From<&'a SentimentSummary> for OverviewRow<'a> {
    fn from(summary: &'a SentimentSummary) -> Self {
        Self {
            symbol: &summary.symbol,
            avg_sentiment: round2(summary.avg_sentiment),
            total_articles: summary.total_articles,
            positive_count: summary.positive_count,
            negative_count: summary.negative_count,
            neutral_count: summary.neutral_count,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn symbol_prompt(symbol: &str, articles_json: &str) -> String {
    format!(
        r#"Analyze the recent news sentiment for {symbol} stock and provide a concise investment research summary.

Recent News Articles:
{articles_json}

Please provide:
1. **Overall Sentiment**: Brief assessment of market sentiment
2. **Key Themes**: Main topics driving the news
3. **Investment Implications**: What this means for potential investors
4. **Risk Factors**: Any concerning trends or news

Keep it concise but insightful. Focus on actionable insights for investors."#
    )
}

fn overview_prompt(summaries_json: &str) -> String {
    format!(
        r#"Based on this sentiment analysis of major tech stocks, provide a brief market overview:

Stock Sentiment Summary:
{summaries_json}

Provide:
1. **Market Mood**: Overall sentiment across these stocks
2. **Leaders & Laggards**: Which stocks have best/worst sentiment
3. **Trends**: Any patterns you notice
4. **Outlook**: Brief investment perspective

Keep it under 200 words and actionable."#
    )
}

/// Narrative text plus the tone bucket the dashboard styles it with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub symbol: Option<String>,
    pub text: String,
    pub tone: SentimentLabel,
}

/// Produces prose research notes from scored articles and summaries.
pub struct NarrativeSummarizer {
    backend: Option<Box<dyn CompletionBackend>>,
    config: NarrativeConfig,
}

impl NarrativeSummarizer {
    /// A `None` backend means no API key; every request then fails with
    /// `SummarizationError::MissingApiKey`.
    pub fn new(backend: Option<Box<dyn CompletionBackend>>, config: NarrativeConfig) -> Self {
        Self { backend, config }
    }

    pub fn claude(api_key: Option<&str>, config: NarrativeConfig) -> Self {
        let backend = api_key.map(|key| {
            Box::new(ClaudeBackend::new(ClaudeClient::new(key), config.model.clone()))
                as Box<dyn CompletionBackend>
        });
        Self::new(backend, config)
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    async fn request(&self, prompt: &str, max_tokens: u64) -> Result<String, SummarizationError> {
        let backend = self.backend.as_ref().ok_or(SummarizationError::MissingApiKey)?;
        let text = backend.complete(prompt, max_tokens).await?;
        if text.trim().is_empty() {
            return Err(SummarizationError::EmptyResponse);
        }
        Ok(text)
    }

    /// Research summary for `symbol`. Returns the fixed no-news message,
    /// without calling the backend, when no article matches.
    pub async fn try_summarize_symbol(&self, symbol: &str, scored: &[ScoredArticle]) -> Result<String, SummarizationError> {
        let articles: Vec<PromptArticle> = scored
            .iter()
            .filter(|a| a.symbol() == symbol)
            .take(self.config.max_articles)
            .map(PromptArticle::from)
            .collect();

        if articles.is_empty() {
            return Ok(NO_NEWS_MESSAGE.to_string());
        }

        let articles_json = serde_json::to_string_pretty(&articles)
            .map_err(|e| SummarizationError::Prompt(e.to_string()))?;

        info!("📝 Generating research summary for {} from {} articles...", symbol, articles.len());
        self.request(&symbol_prompt(symbol, &articles_json), self.config.symbol_max_tokens).await
    }

    pub async fn summarize_symbol(&self, symbol: &str, scored: &[ScoredArticle]) -> String {
        match self.try_summarize_symbol(symbol, scored).await {
            Ok(text) => text,
            Err(e) => {
                warn!(symbol, error = %e, "research summary failed");
                format!("Error generating AI summary for {}", symbol)
            }
        }
    }

    pub async fn try_summarize_market(&self, summaries: &[SentimentSummary]) -> Result<String, SummarizationError> {
        let rows: Vec<OverviewRow> = summaries.iter().map(OverviewRow::from).collect();
        let summaries_json = serde_json::to_string_pretty(&rows)
            .map_err(|e| SummarizationError::Prompt(e.to_string()))?;

        info!("🌍 Generating market overview across {} symbols...", rows.len());
        self.request(&overview_prompt(&summaries_json), self.config.overview_max_tokens).await
    }

    pub async fn summarize_market(&self, summaries: &[SentimentSummary]) -> String {
        match self.try_summarize_market(summaries).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "market overview failed");
                OVERVIEW_ERROR_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Classification};
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        prompts: Vec<(String, u64)>,
    }

    struct FakeBackend {
        reply: Result<String, String>,
        calls: Arc<Mutex<Recorded>>,
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        async fn complete(&self, prompt: &str, max_tokens: u64) -> Result<String, SummarizationError> {
            self.calls.lock().unwrap().prompts.push((prompt.to_string(), max_tokens));
            self.reply.clone().map_err(SummarizationError::Api)
        }
    }

    fn summarizer(reply: Result<&str, &str>) -> (NarrativeSummarizer, Arc<Mutex<Recorded>>) {
        let calls = Arc::new(Mutex::new(Recorded::default()));
        let backend = FakeBackend {
            reply: reply.map(str::to_string).map_err(str::to_string),
            calls: calls.clone(),
        };
        (NarrativeSummarizer::new(Some(Box::new(backend)), NarrativeConfig::default()), calls)
    }

    fn scored(symbol: &str, title: &str, score: f64) -> ScoredArticle {
        let article = Article {
            symbol: symbol.to_string(),
            title: title.to_string(),
            description: format!("{title} details"),
            content: None,
            source: "Reuters".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap(),
            url: String::new(),
        };
        ScoredArticle::new(article, Classification {
            sentiment_score: score,
            confidence: score.abs(),
            label: SentimentLabel::bucket(score),
            status: crate::models::ClassificationStatus::Classified,
        })
    }

    #[tokio::test]
    async fn empty_list_returns_fixed_message_without_calling_out() {
        let (summarizer, calls) = summarizer(Ok("unused"));

        assert_eq!(summarizer.summarize_symbol("AAPL", &[]).await, NO_NEWS_MESSAGE);
        let other_symbol = vec![scored("TSLA", "Tesla news", 0.2)];
        assert_eq!(summarizer.summarize_symbol("AAPL", &other_symbol).await, NO_NEWS_MESSAGE);

        assert!(calls.lock().unwrap().prompts.is_empty());
    }

    #[tokio::test]
    async fn symbol_prompt_carries_rounded_articles() {
        let (summarizer, calls) = summarizer(Ok("Bullish overall."));
        let articles: Vec<ScoredArticle> = (0..12)
            .map(|i| scored("AAPL", &format!("Headline {i}"), 0.8765))
            .collect();

        let text = summarizer.summarize_symbol("AAPL", &articles).await;
        assert_eq!(text, "Bullish overall.");

        let calls = calls.lock().unwrap();
        let (prompt, max_tokens) = &calls.prompts[0];
        assert_eq!(*max_tokens, 500);
        assert!(prompt.contains("news sentiment for AAPL stock"));
        assert!(prompt.contains("\"sentiment_score\": 0.88"));
        assert!(prompt.contains("\"date\": \"2024-05-02\""));
        assert!(prompt.contains("Headline 9"));
        assert!(!prompt.contains("Headline 10"));
        assert!(prompt.contains("**Risk Factors**"));
    }

    #[tokio::test]
    async fn failures_become_error_strings() {
        let (summarizer, _) = summarizer(Err("overloaded"));
        let articles = vec![scored("NVDA", "Chips", 0.5)];

        assert_eq!(
            summarizer.summarize_symbol("NVDA", &articles).await,
            "Error generating AI summary for NVDA"
        );
        assert_eq!(
            summarizer.summarize_market(&[SentimentSummary::empty("NVDA")]).await,
            OVERVIEW_ERROR_MESSAGE
        );
        assert!(matches!(
            summarizer.try_summarize_symbol("NVDA", &articles).await,
            Err(SummarizationError::Api(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_and_blank_reply_are_errors() {
        let unconfigured = NarrativeSummarizer::claude(None, NarrativeConfig::default());
        assert!(!unconfigured.is_configured());
        let articles = vec![scored("META", "Ads", 0.3)];
        assert!(matches!(
            unconfigured.try_summarize_symbol("META", &articles).await,
            Err(SummarizationError::MissingApiKey)
        ));
        assert_eq!(
            unconfigured.summarize_symbol("META", &articles).await,
            "Error generating AI summary for META"
        );

        let (blank, _) = summarizer(Ok("   "));
        assert!(matches!(
            blank.try_summarize_market(&[]).await,
            Err(SummarizationError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn overview_uses_summary_rows() {
        let (summarizer, calls) = summarizer(Ok("Mood: mixed"));
        let mut aapl = SentimentSummary::empty("AAPL");
        aapl.avg_sentiment = 0.4567;
        aapl.total_articles = 2;
        aapl.positive_count = 2;
        aapl.latest_articles = vec![scored("AAPL", "Should not leak", 0.5)];

        let text = summarizer.summarize_market(&[aapl, SentimentSummary::empty("TSLA")]).await;
        assert_eq!(text, "Mood: mixed");

        let calls = calls.lock().unwrap();
        let (prompt, max_tokens) = &calls.prompts[0];
        assert_eq!(*max_tokens, 300);
        assert!(prompt.contains("\"avg_sentiment\": 0.46"));
        assert!(prompt.contains("\"symbol\": \"TSLA\""));
        assert!(!prompt.contains("Should not leak"));
        assert!(prompt.contains("under 200 words"));
    }
}
