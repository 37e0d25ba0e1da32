use std::sync::Arc;
use tracing::debug;

use crate::models::{Article, ScoredArticle, SentimentLabel, SentimentSummary};
use super::classifier::SentimentClassifier;

/// Number of articles carried in a summary's `latest_articles`.
pub const LATEST_ARTICLES: usize = 3;

/// Classifies articles and reduces them into per-symbol summaries.
#[derive(Clone)]
pub struct SentimentAggregator {
    classifier: Arc<SentimentClassifier>,
}

impl SentimentAggregator {
    pub fn new(classifier: Arc<SentimentClassifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &SentimentClassifier {
        &self.classifier
    }

    /// Scores every article in input order, one classifier call at a time.
    pub async fn analyze(&self, articles: &[Article]) -> Vec<ScoredArticle> {
        let mut scored = Vec::with_capacity(articles.len());

        for article in articles {
            let classification = self.classifier
                .classify(&article.classification_text())
                .await;
            scored.push(ScoredArticle::new(article.clone(), classification));
        }

        debug!(
            articles = scored.len(),
            fallbacks = scored.iter().filter(|a| a.is_fallback()).count(),
            "analyzed articles"
        );
        scored
    }

    /// Reduces the scored articles belonging to `symbol`.
    ///
    /// `latest_articles` are the first three matches in source order; no
    /// re-sorting by timestamp is done.
    pub fn summarize(scored: &[ScoredArticle], symbol: &str) -> SentimentSummary {
        let matching: Vec<&ScoredArticle> = scored
            .iter()
            .filter(|a| a.symbol() == symbol)
            .collect();

        if matching.is_empty() {
            return SentimentSummary::empty(symbol);
        }

        let mut summary = SentimentSummary::empty(symbol);
        let mut total = 0.0;

        for article in &matching {
            total += article.sentiment_score;
            match SentimentLabel::bucket(article.sentiment_score) {
                SentimentLabel::Positive => summary.positive_count += 1,
                SentimentLabel::Negative => summary.negative_count += 1,
                SentimentLabel::Neutral => summary.neutral_count += 1,
            }
            if article.is_fallback() {
                summary.failed_classifications += 1;
            }
        }

        summary.total_articles = matching.len();
        summary.avg_sentiment = total / matching.len() as f64;
        summary.latest_articles = matching
            .into_iter()
            .take(LATEST_ARTICLES)
            .cloned()
            .collect();
        summary
    }
}
