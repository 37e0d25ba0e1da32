pub mod narrative;

pub use narrative::{
    ClaudeBackend,
    CompletionBackend,
    Narrative,
    NarrativeSummarizer,
    NO_NEWS_MESSAGE,
    OVERVIEW_ERROR_MESSAGE,
};
