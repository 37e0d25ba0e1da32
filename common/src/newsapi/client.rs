use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::types::{EverythingParams, NewsApiArticle, NewsApiResponse};
use super::error::NewsApiError;

pub const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: &str) -> Result<Self, NewsApiError> {
        Self::with_timeout(api_key, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_key: &str, timeout: Duration) -> Result<Self, NewsApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: NEWS_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub async fn everything(&self, params: &EverythingParams) -> Result<Vec<NewsApiArticle>, NewsApiError> {
        debug!(query = %params.query, from = %params.from, to = %params.to, "NewsAPI everything request");

        let response = self.client
            .get(&self.base_url)
            .query(&params.to_query(&self.api_key))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: NewsApiResponse = response
                    .json()
                    .await
                    .map_err(|e| NewsApiError::InvalidResponse(e.to_string()))?;

                if body.status != "ok" {
                    return Err(NewsApiError::ApiError {
                        status: StatusCode::OK.as_u16(),
                        message: body.message.unwrap_or(body.status),
                    });
                }

                debug!(returned = body.articles.len(), total = ?body.total_results, "NewsAPI response");
                Ok(body.articles)
            },
            StatusCode::UNAUTHORIZED => Err(NewsApiError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(NewsApiError::RateLimit),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                // NewsAPI error bodies are JSON with a human readable `message`.
                let message = serde_json::from_str::<NewsApiResponse>(&error_text)
                    .ok()
                    .and_then(|body| body.message)
                    .unwrap_or(error_text);
                Err(NewsApiError::ApiError { status: status.as_u16(), message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsapi::SortBy;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;

    fn params() -> EverythingParams {
        EverythingParams {
            query: "\"AAPL\" OR \"Apple\"".to_string(),
            from: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            language: "en".to_string(),
            sort_by: SortBy::PublishedAt,
            page_size: 20,
        }
    }

    #[tokio::test]
    async fn sends_everything_query_parameters() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(GET)
                .path("/v2/everything")
                .query_param("q", "\"AAPL\" OR \"Apple\"")
                .query_param("from", "2024-05-01")
                .query_param("to", "2024-05-04")
                .query_param("language", "en")
                .query_param("sortBy", "publishedAt")
                .query_param("pageSize", "20")
                .query_param("apiKey", "secret");
            then.status(200).json_body(json!({
                "status": "ok",
                "totalResults": 1,
                "articles": [{
                    "source": { "id": null, "name": "Reuters" },
                    "author": "Jane Doe",
                    "title": "Apple beats earnings",
                    "description": "Record profit",
                    "url": "https://example.com/apple",
                    "publishedAt": "2024-05-03T12:30:00Z",
                    "content": "Apple reported..."
                }]
            }));
        }).await;

        let client = NewsApiClient::new("secret").unwrap().with_base_url(&server.url("/v2/everything"));
        let articles = client.everything(&params()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("Apple beats earnings"));
        assert_eq!(articles[0].source.name.as_deref(), Some("Reuters"));
        assert!(articles[0].published_at.is_some());
    }

    #[tokio::test]
    async fn maps_status_codes_to_errors() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/limited");
            then.status(429);
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/denied");
            then.status(401);
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/broken");
            then.status(426).json_body(json!({
                "status": "error",
                "code": "parameterInvalid",
                "message": "You are trying to request results too far in the past."
            }));
        }).await;

        let limited = NewsApiClient::new("k").unwrap().with_base_url(&server.url("/limited"));
        assert!(matches!(limited.everything(&params()).await, Err(NewsApiError::RateLimit)));

        let denied = NewsApiClient::new("k").unwrap().with_base_url(&server.url("/denied"));
        assert!(matches!(denied.everything(&params()).await, Err(NewsApiError::Unauthorized)));

        let broken = NewsApiClient::new("k").unwrap().with_base_url(&server.url("/broken"));
        match broken.everything(&params()).await {
            Err(NewsApiError::ApiError { status, message }) => {
                assert_eq!(status, 426);
                assert!(message.contains("too far in the past"));
            },
            other => panic!("unexpected result: {:?}", other.map(|a| a.len())),
        }
    }

    #[tokio::test]
    async fn error_envelope_with_ok_status_code_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200).json_body(json!({
                "status": "error",
                "code": "maximumResultsReached",
                "message": "You have requested too many results."
            }));
        }).await;

        let client = NewsApiClient::new("k").unwrap().with_base_url(&server.url("/v2/everything"));
        assert!(matches!(
            client.everything(&params()).await,
            Err(NewsApiError::ApiError { .. })
        ));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/v2/everything");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "status": "ok", "totalResults": 0, "articles": [] }));
        }).await;

        let client = NewsApiClient::with_timeout("k", Duration::from_millis(200))
            .unwrap()
            .with_base_url(&server.url("/v2/everything"));
        match client.everything(&params()).await {
            Err(NewsApiError::ReqwestError(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {:?}", other.map(|a| a.len())),
        }
    }
}
