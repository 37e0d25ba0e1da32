mod error;
mod types;
mod client;

pub use error::NewsApiError;
pub use types::{NewsApiArticle, NewsApiResponse, NewsApiSource, EverythingParams, SortBy};
pub use client::{NewsApiClient, NEWS_API_URL};
