#[derive(Debug, thiserror::Error)]
pub enum NewsApiError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Unauthorized: check NEWS_API_KEY")]
    Unauthorized,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
}
