use std::path::PathBuf;
use std::time::Duration;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dotenv::dotenv;
use stock_sentiment::{
    config::{DEFAULT_CONFIG_PATH, DEFAULT_SECRETS_PATH},
    display,
    middleware::cors_middleware,
    routes,
    Secrets, SentimentTerminal, Settings,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "News sentiment dashboard for a watchlist of stocks", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, env = "TERMINAL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Secret store holding API keys
    #[arg(long, env = "TERMINAL_SECRETS", default_value = DEFAULT_SECRETS_PATH)]
    secrets: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the market and sentiment dashboard
    Report {
        /// Ticker whose articles are shown (defaults to the first configured)
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Research summary for one ticker
    Analyze { symbol: String },
    /// Cross-market overview
    Overview,
    /// Serve the dashboard JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,

        /// Reload both boards every N seconds
        #[arg(long)]
        auto_refresh: Option<u64>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let secrets = Secrets::load(&cli.secrets)?;

    info!("🚀 Starting sentiment terminal for {}", settings.symbols().join(", "));
    let mut terminal = SentimentTerminal::from_settings(settings, &secrets)?;

    match cli.command.unwrap_or(Command::Report { symbol: None }) {
        Command::Report { symbol } => {
            let selected = symbol
                .map(|s| s.trim().to_uppercase())
                .or_else(|| terminal.tickers().first().map(|t| t.symbol.clone()))
                .unwrap_or_default();
            let columns = terminal.settings().dashboard.heatmap_columns;

            let market = terminal.market_board().await.clone();
            let sentiment = terminal.sentiment_board().await;
            display::print_report(&market, sentiment, &selected, columns);
        }
        Command::Analyze { symbol } => {
            let symbol = symbol.trim().to_uppercase();
            let narrative = terminal.analyze_symbol(&symbol).await?;
            let company = terminal.settings().company_name(&symbol);
            let heading = format!("🤖 AI analysis for {} ({})", company, symbol);
            println!("\n{} ({})\n", heading.bold(), narrative.tone);
            println!("{}", narrative.text);
        }
        Command::Overview => {
            let narrative = terminal.market_overview().await;
            println!("\n{} ({})\n", "🌍 Market overview".bold(), narrative.tone);
            println!("{}", narrative.text);
        }
        Command::Serve { bind, auto_refresh } => serve(terminal, &bind, auto_refresh).await?,
    }

    Ok(())
}

async fn serve(terminal: SentimentTerminal, bind: &str, auto_refresh: Option<u64>) -> Result<()> {
    let state = web::Data::new(Mutex::new(terminal));

    if let Some(secs) = auto_refresh.filter(|s| *s > 0) {
        let state = state.clone();
        info!("⏳ Auto-refresh every {} seconds", secs);
        actix_web::rt::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut terminal = state.lock().await;
                terminal.refresh();
                let loaded = terminal.sentiment_board().await.symbols.len();
                terminal.market_board().await;
                info!("🔄 Auto-refresh complete ({} tickers)", loaded);
            }
        });
    } else if auto_refresh == Some(0) {
        warn!("--auto-refresh 0 ignored");
    }

    info!("🌐 Listening on http://{}", bind);
    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .app_data(state.clone())
            .configure(routes::config)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
