use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::newsapi::{EverythingParams, NewsApiArticle, NewsApiClient, NewsApiError, SortBy};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{NewsConfig, Settings};
use crate::models::{Article, FetchError};

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Recent articles about `symbol` from the last `lookback_days` days.
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Article>, FetchError>;
}

/// Builds the search query: the quoted ticker OR the quoted company name.
pub fn build_query(symbol: &str, company: &str) -> String {
    format!("\"{}\" OR \"{}\"", symbol, company)
}

/// Inclusive date window ending on `now`'s date. Saturates at the earliest
/// representable date.
pub fn date_range(now: DateTime<Utc>, lookback_days: u32) -> (NaiveDate, NaiveDate) {
    let from = now
        .checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    (from.date_naive(), now.date_naive())
}

pub struct NewsApiArticleSource {
    client: Option<NewsApiClient>,
    companies: HashMap<String, String>,
    language: String,
    page_size: u32,
}

impl NewsApiArticleSource {
    /// `api_key` may be absent; every fetch then fails with `FetchError::MissingApiKey`.
    pub fn new(api_key: Option<&str>, settings: &Settings) -> Result<Self, NewsApiError> {
        let client = api_key
            .map(|key| NewsApiClient::new(key).map(|c| c.with_base_url(&settings.news.base_url)))
            .transpose()?;
        let companies = settings
            .tickers
            .iter()
            .map(|t| (t.symbol.clone(), t.company.clone()))
            .collect();
        Ok(Self::with_client(client, companies, &settings.news))
    }

    pub fn with_client(client: Option<NewsApiClient>, companies: HashMap<String, String>, news: &NewsConfig) -> Self {
        Self {
            client,
            companies,
            language: news.language.clone(),
            page_size: news.page_size,
        }
    }

    fn company_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.companies.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    fn to_article(symbol: &str, raw: NewsApiArticle) -> Option<Article> {
        let title = raw.title.filter(|t| !t.trim().is_empty())?;
        let description = raw.description.filter(|d| !d.trim().is_empty())?;
        let published_at = raw.published_at?;

        Some(Article {
            symbol: symbol.to_string(),
            title,
            description,
            content: raw.content,
            source: raw.source.name.unwrap_or_else(|| "Unknown".to_string()),
            published_at,
            url: raw.url.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ArticleSource for NewsApiArticleSource {
    async fn fetch(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Article>, FetchError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(FetchError::InvalidSymbol(symbol.to_string()));
        }
        let client = self.client.as_ref().ok_or(FetchError::MissingApiKey)?;

        let (from, to) = date_range(Utc::now(), lookback_days);
        let params = EverythingParams {
            query: build_query(symbol, self.company_name(symbol)),
            from,
            to,
            language: self.language.clone(),
            sort_by: SortBy::PublishedAt,
            page_size: self.page_size,
        };

        info!("📰 Fetching news for {}...", symbol);
        let raw = client.everything(&params).await.map_err(|e| match e {
            NewsApiError::RateLimit => FetchError::RateLimited { symbol: symbol.to_string() },
            NewsApiError::Unauthorized => FetchError::Unauthorized { symbol: symbol.to_string() },
            other => FetchError::Request { symbol: symbol.to_string(), reason: other.to_string() },
        })?;

        let returned = raw.len();
        let articles: Vec<Article> = raw
            .into_iter()
            .filter_map(|a| Self::to_article(symbol, a))
            .collect();

        debug!(symbol, returned, kept = articles.len(), "filtered unusable articles");
        Ok(articles)
    }
}
