use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/terminal.toml";
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";
const ENV_PREFIX: &str = "TERMINAL";
/// NewsAPI keeps at most about a year of history.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub company: String,
}

impl Ticker {
    fn new(symbol: &str, company: &str) -> Self {
        Self { symbol: symbol.to_string(), company: company.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub lookback_days: u32,
    pub page_size: u32,
    pub language: String,
    pub request_delay_ms: u64,
    /// Declared for reference; not sent as a request filter.
    pub preferred_sources: Vec<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: common::newsapi::NEWS_API_URL.to_string(),
            lookback_days: 3,
            page_size: 20,
            language: "en".to_string(),
            request_delay_ms: 1000,
            preferred_sources: vec![
                "reuters".to_string(),
                "bloomberg".to_string(),
                "cnbc".to_string(),
                "financial-times".to_string(),
                "the-wall-street-journal".to_string(),
                "business-insider".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    Finbert,
    Lexicon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub model: String,
    /// Overrides the inference endpoint; `None` uses the hosted API.
    pub base_url: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Finbert,
            model: common::providers::FINBERT.to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub model: String,
    pub symbol_max_tokens: u64,
    pub overview_max_tokens: u64,
    pub max_articles: usize,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            model: common::providers::CLAUDE_3_HAIKU.to_string(),
            symbol_max_tokens: 500,
            overview_max_tokens: 300,
            max_articles: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub base_url: String,
    pub range: String,
    pub interval: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            range: "5d".to_string(),
            interval: "1d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub market_ttl_secs: u64,
    pub sentiment_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            market_ttl_secs: 3600,
            sentiment_ttl_secs: 1800,
        }
    }
}

impl CacheConfig {
    pub fn market_ttl(&self) -> Duration {
        Duration::from_secs(self.market_ttl_secs)
    }

    pub fn sentiment_ttl(&self) -> Duration {
        Duration::from_secs(self.sentiment_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Scored articles kept per ticker for cards and narratives.
    pub articles_per_symbol: usize,
    pub heatmap_columns: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            articles_per_symbol: 5,
            heatmap_columns: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tickers: Vec<Ticker>,
    pub news: NewsConfig,
    pub classifier: ClassifierConfig,
    pub narrative: NarrativeConfig,
    pub market: MarketConfig,
    pub cache: CacheConfig,
    pub dashboard: DashboardConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tickers: vec![
                Ticker::new("AAPL", "Apple"),
                Ticker::new("TSLA", "Tesla"),
                Ticker::new("GOOGL", "Google"),
                Ticker::new("MSFT", "Microsoft"),
                Ticker::new("AMZN", "Amazon"),
                Ticker::new("NVDA", "Nvidia"),
                Ticker::new("META", "Meta"),
                Ticker::new("NFLX", "Netflix"),
            ],
            news: NewsConfig::default(),
            classifier: ClassifierConfig::default(),
            narrative: NarrativeConfig::default(),
            market: MarketConfig::default(),
            cache: CacheConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Settings {
    /// Loads the TOML file (if present) and overlays `TERMINAL__*` variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::Invalid("at least one ticker is required".to_string()));
        }
        for ticker in &mut self.tickers {
            ticker.symbol = ticker.symbol.trim().to_uppercase();
            if ticker.symbol.is_empty() {
                return Err(ConfigError::Invalid("ticker symbol must not be empty".to_string()));
            }
        }
        if self.news.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "news.lookback_days must be at most {}, got {}",
                MAX_LOOKBACK_DAYS, self.news.lookback_days
            )));
        }
        if self.dashboard.heatmap_columns == 0 {
            return Err(ConfigError::Invalid("dashboard.heatmap_columns must be positive".to_string()));
        }
        Ok(self)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.tickers.iter().map(|t| t.symbol.clone()).collect()
    }

    /// Company name for a symbol, or the symbol itself when unmapped.
    pub fn company_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.tickers
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.company.as_str())
            .unwrap_or(symbol)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SecretsFile {
    #[serde(default, alias = "NEWS_API_KEY")]
    news_api_key: Option<String>,
    #[serde(default, alias = "CLAUDE_API_KEY")]
    claude_api_key: Option<String>,
    #[serde(default, alias = "HF_API_TOKEN")]
    hf_api_token: Option<String>,
}

/// API credentials. The secret store file wins; the environment is the fallback.
#[derive(Clone, Default)]
pub struct Secrets {
    pub news_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub hf_api_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("news_api_key", &self.news_api_key.as_ref().map(|_| "<set>"))
            .field("claude_api_key", &self.claude_api_key.as_ref().map(|_| "<set>"))
            .field("hf_api_token", &self.hf_api_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Secrets {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file: SecretsFile = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml).required(false))
            .build()?
            .try_deserialize()?;
        Ok(Self::resolve(file, |name| std::env::var(name).ok()))
    }

    fn resolve(file: SecretsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |stored: Option<String>, name: &str| {
            stored
                .filter(|v| !v.trim().is_empty())
                .or_else(|| env(name).filter(|v| !v.trim().is_empty()))
        };

        Self {
            news_api_key: pick(file.news_api_key, "NEWS_API_KEY"),
            claude_api_key: pick(file.claude_api_key, "CLAUDE_API_KEY"),
            hf_api_token: pick(file.hf_api_token, "HF_API_TOKEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tracked_universe() {
        let settings = Settings::default();
        assert_eq!(
            settings.symbols(),
            vec!["AAPL", "TSLA", "GOOGL", "MSFT", "AMZN", "NVDA", "META", "NFLX"]
        );
        assert_eq!(settings.news.page_size, 20);
        assert_eq!(settings.news.lookback_days, 3);
        assert_eq!(settings.cache.market_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.cache.sentiment_ttl(), Duration::from_secs(1800));
        assert_eq!(settings.narrative.max_articles, 10);
    }

    #[test]
    fn toml_overrides_selected_sections() {
        let settings = Settings::from_toml_str(r#"
            [[tickers]]
            symbol = " amd "
            company = "AMD"

            [news]
            lookback_days = 7

            [classifier]
            backend = "lexicon"
        "#).unwrap();

        assert_eq!(settings.symbols(), vec!["AMD"]);
        assert_eq!(settings.news.lookback_days, 7);
        assert_eq!(settings.news.page_size, 20);
        assert_eq!(settings.classifier.backend, ClassifierBackend::Lexicon);
        assert_eq!(settings.cache.sentiment_ttl_secs, 1800);
    }

    #[test]
    fn empty_ticker_list_is_rejected() {
        let err = Settings::from_toml_str("tickers = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_lookback_is_rejected() {
        let err = Settings::from_toml_str("[news]\nlookback_days = 200000000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("lookback_days")));

        let settings = Settings::from_toml_str("[news]\nlookback_days = 365").unwrap();
        assert_eq!(settings.news.lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn company_name_falls_back_to_symbol() {
        let settings = Settings::default();
        assert_eq!(settings.company_name("NVDA"), "Nvidia");
        assert_eq!(settings.company_name("IBM"), "IBM");
    }

    #[test]
    fn secret_file_wins_over_environment() {
        let file = SecretsFile {
            news_api_key: Some("from-file".to_string()),
            claude_api_key: Some("  ".to_string()),
            hf_api_token: None,
        };
        let secrets = Secrets::resolve(file, |name| match name {
            "NEWS_API_KEY" => Some("from-env".to_string()),
            "CLAUDE_API_KEY" => Some("claude-env".to_string()),
            _ => None,
        });

        assert_eq!(secrets.news_api_key.as_deref(), Some("from-file"));
        assert_eq!(secrets.claude_api_key.as_deref(), Some("claude-env"));
        assert!(secrets.hf_api_token.is_none());
        assert!(!format!("{:?}", secrets).contains("from-file"));
    }
}
