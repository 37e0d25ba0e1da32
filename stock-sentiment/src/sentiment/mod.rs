pub mod aggregator;
pub mod classifier;
pub mod lexicon;

pub use aggregator::{SentimentAggregator, LATEST_ARTICLES};
pub use classifier::{
    FinBertBackend, LexiconBackend, ModelBackend, Prediction, SentimentClassifier, MAX_INPUT_CHARS,
};
pub use lexicon::FinancialLexicon;
