pub mod error;
pub mod newsapi;
pub mod providers;

pub use error::AgentError;
pub use newsapi::{NewsApiClient, NewsApiError};
pub use providers::*;
