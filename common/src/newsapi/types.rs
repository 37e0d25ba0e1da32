use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

/// Body of a `/v2/everything` response. Error responses share the envelope
/// and carry `code`/`message` instead of `articles`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    #[serde(default)]
    pub source: NewsApiSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevancy,
    Popularity,
    PublishedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
            SortBy::PublishedAt => "publishedAt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EverythingParams {
    pub query: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub language: String,
    pub sort_by: SortBy,
    pub page_size: u32,
}

impl EverythingParams {
    pub fn to_query(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.clone()),
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
            ("language", self.language.clone()),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("pageSize", self.page_size.to_string()),
            ("apiKey", api_key.to_string()),
        ]
    }
}
