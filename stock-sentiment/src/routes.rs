use actix_web::{get, http::StatusCode, post, web, HttpResponse, ResponseError};
use serde_json::json;
use tokio::sync::Mutex;

use crate::display::{heatmap, ArticleCard, GaugeZone};
use crate::models::MissingDataError;
use crate::SentimentTerminal;

pub type TerminalState = web::Data<Mutex<SentimentTerminal>>;

impl ResponseError for MissingDataError {
    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::NotFound().json(json!({ "error": self.to_string() }))
    }
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[get("/api/tickers")]
pub async fn tickers(terminal: TerminalState) -> HttpResponse {
    let terminal = terminal.lock().await;
    HttpResponse::Ok().json(terminal.tickers())
}

#[get("/api/market")]
pub async fn market_board(terminal: TerminalState) -> HttpResponse {
    let mut terminal = terminal.lock().await;
    HttpResponse::Ok().json(terminal.market_board().await)
}

#[get("/api/market/{symbol}")]
pub async fn market_symbol(terminal: TerminalState, symbol: web::Path<String>) -> Result<HttpResponse, MissingDataError> {
    let mut terminal = terminal.lock().await;
    let snapshot = terminal.symbol_market(&symbol).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[get("/api/sentiment")]
pub async fn sentiment_board(terminal: TerminalState) -> HttpResponse {
    let mut terminal = terminal.lock().await;
    let board = terminal.sentiment_board().await.clone();
    let freshness = terminal.sentiment_freshness();
    HttpResponse::Ok().json(json!({
        "computed_at": freshness.map(|(computed, _)| computed),
        "expires_at": freshness.map(|(_, expires)| expires),
        "symbols": board.symbols,
    }))
}

#[get("/api/sentiment/{symbol}")]
pub async fn sentiment_symbol(terminal: TerminalState, symbol: web::Path<String>) -> Result<HttpResponse, MissingDataError> {
    let mut terminal = terminal.lock().await;
    let entry = terminal.symbol_sentiment(&symbol).await?;
    let cards: Vec<ArticleCard> = entry.articles.iter().map(ArticleCard::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "summary": entry.summary,
        "gauge": GaugeZone::for_score(entry.summary.avg_sentiment),
        "feed": entry.feed,
        "cards": cards,
    })))
}

#[get("/api/heatmap")]
pub async fn sentiment_heatmap(terminal: TerminalState) -> HttpResponse {
    let mut terminal = terminal.lock().await;
    let columns = terminal.settings().dashboard.heatmap_columns;
    let summaries = terminal.sentiment_board().await.summaries();
    HttpResponse::Ok().json(heatmap(&summaries, columns))
}

#[get("/api/analysis/{symbol}")]
pub async fn symbol_analysis(terminal: TerminalState, symbol: web::Path<String>) -> Result<HttpResponse, MissingDataError> {
    let mut terminal = terminal.lock().await;
    let narrative = terminal.analyze_symbol(&symbol).await?;
    Ok(HttpResponse::Ok().json(narrative))
}

#[get("/api/overview")]
pub async fn market_overview(terminal: TerminalState) -> HttpResponse {
    let mut terminal = terminal.lock().await;
    HttpResponse::Ok().json(terminal.market_overview().await)
}

#[post("/api/refresh")]
pub async fn refresh(terminal: TerminalState) -> HttpResponse {
    terminal.lock().await.refresh();
    HttpResponse::Ok().json(json!({ "status": "refreshed" }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(tickers)
        .service(market_board)
        .service(market_symbol)
        .service(sentiment_board)
        .service(sentiment_symbol)
        .service(sentiment_heatmap)
        .service(symbol_analysis)
        .service(market_overview)
        .service(refresh);
}
