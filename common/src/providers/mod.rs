pub mod anthropic;
pub mod finbert;

pub use self::anthropic::{Client as ClaudeClient, CLAUDE_3_HAIKU};

pub use finbert::{FinBertClient, LabelScore, FINBERT};
