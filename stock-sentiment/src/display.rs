//! Shapes boards into dashboard-ready pieces: gauge zones, the heatmap grid,
//! article cards, and the colored terminal report built from them.

use colored::*;
use serde::Serialize;

use crate::models::{MarketBoard, ScoredArticle, SentimentBoard, SentimentLabel, SentimentSummary};

/// Gauge band edges.
pub const GAUGE_THRESHOLD: f64 = 0.3;
pub const CARD_TITLE_CHARS: usize = 80;
pub const CARDS_IN_REPORT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeZone {
    Bearish,
    Neutral,
    Bullish,
}

impl GaugeZone {
    pub fn for_score(score: f64) -> Self {
        if score < -GAUGE_THRESHOLD {
            GaugeZone::Bearish
        } else if score > GAUGE_THRESHOLD {
            GaugeZone::Bullish
        } else {
            GaugeZone::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub symbol: String,
    pub avg_sentiment: f64,
    pub label: SentimentLabel,
}

/// Row-major grid of summaries, `columns` wide. The last row may be short.
pub fn heatmap(summaries: &[SentimentSummary], columns: usize) -> Vec<Vec<HeatCell>> {
    summaries
        .chunks(columns.max(1))
        .map(|row| {
            row.iter()
                .map(|s| HeatCell {
                    symbol: s.symbol.clone(),
                    avg_sentiment: s.avg_sentiment,
                    label: SentimentLabel::bucket(s.avg_sentiment),
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleCard {
    pub indicator: &'static str,
    pub title: String,
    pub source: String,
    pub date: String,
    pub description: String,
    pub url: String,
    pub sentiment_score: f64,
    pub label: SentimentLabel,
}

impl ArticleCard {
    pub fn indicator_for(score: f64) -> &'static str {
        match SentimentLabel::bucket(score) {
            SentimentLabel::Positive => "🟢",
            SentimentLabel::Negative => "🔴",
            SentimentLabel::Neutral => "🟡",
        }
    }
}

impl From<&ScoredArticle> for ArticleCard {
    fn from(scored: &ScoredArticle) -> Self {
        Self {
            indicator: Self::indicator_for(scored.sentiment_score),
            title: truncate_title(&scored.article.title, CARD_TITLE_CHARS),
            source: scored.article.source.clone(),
            date: scored.article.published_at.format("%Y-%m-%d").to_string(),
            description: scored.article.description.clone(),
            url: scored.article.url.clone(),
            sentiment_score: scored.sentiment_score,
            label: SentimentLabel::bucket(scored.sentiment_score),
        }
    }
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    match title.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &title[..idx]),
        None => title.to_string(),
    }
}

fn tone(score: f64, text: String) -> ColoredString {
    match SentimentLabel::bucket(score) {
        SentimentLabel::Positive => text.green(),
        SentimentLabel::Negative => text.red(),
        SentimentLabel::Neutral => text.yellow(),
    }
}

/// Prints the metrics table, the heatmap and the selected ticker's cards.
pub fn print_report(market: &MarketBoard, sentiment: &SentimentBoard, selected: &str, columns: usize) {
    println!("\n📊 {}", "Market Sentiment Terminal".bold());
    println!("{}", "═".repeat(78));
    println!(
        "{:<8} {:>12} {:>10} {:>9} {:>12} {:>9}",
        "Symbol", "Price", "Change", "Change%", "Sentiment", "Articles"
    );
    println!("{}", "─".repeat(78));

    for entry in &sentiment.symbols {
        let summary = &entry.summary;
        let (price, change, change_pct) = match market.get(&summary.symbol) {
            Some(snapshot) => {
                let change = format!("{:+.2}", snapshot.change);
                let pct = format!("{:+.2}%", snapshot.change_pct);
                let (change, pct) = if snapshot.is_up() {
                    (change.green(), pct.green())
                } else {
                    (change.red(), pct.red())
                };
                (format!("${:.2}", snapshot.current_price), change, pct)
            }
            None => ("n/a".to_string(), "n/a".dimmed(), "n/a".dimmed()),
        };

        println!(
            "{:<8} {:>12} {:>10} {:>9} {:>12} {:>9}",
            summary.symbol.bold(),
            price,
            change,
            change_pct,
            tone(summary.avg_sentiment, format!("{:+.3}", summary.avg_sentiment)),
            summary.total_articles
        );
    }

    for failure in &market.failures {
        println!("⚠️  {}: {}", failure.symbol, failure.reason.dimmed());
    }

    println!("\n🔥 {}", "Sentiment Heatmap".bold());
    for row in heatmap(&sentiment.summaries(), columns) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| tone(cell.avg_sentiment, format!("{:<6}{:>+6.2}", cell.symbol, cell.avg_sentiment)).to_string())
            .collect();
        println!("  {}", cells.join("  │  "));
    }

    let Some(entry) = sentiment.get(selected) else {
        println!("\n⚠️  No sentiment data for {}", selected);
        return;
    };

    let summary = &entry.summary;
    println!(
        "\n🎯 {} gauge: {:?} ({:+.3})  🟢 {}  🔴 {}  🟡 {}",
        summary.symbol.bold(),
        GaugeZone::for_score(summary.avg_sentiment),
        summary.avg_sentiment,
        summary.positive_count,
        summary.negative_count,
        summary.neutral_count
    );
    if summary.failed_classifications > 0 {
        println!("   {} articles could not be classified", summary.failed_classifications.to_string().yellow());
    }
    if let crate::models::FeedStatus::Unavailable { reason } = &entry.feed {
        println!("   ⚠️  News feed unavailable: {}", reason.dimmed());
    }

    println!("\n📰 {}", "Latest News".bold());
    if entry.articles.is_empty() {
        println!("   No recent news found for this stock.");
    }
    for card in entry.articles.iter().take(CARDS_IN_REPORT).map(ArticleCard::from) {
        println!("{} {}", card.indicator, card.title.bold());
        println!("   {} • {} • {}", card.source, card.date, tone(card.sentiment_score, format!("{:+.3}", card.sentiment_score)));
        println!("   {}", card.description);
        if !card.url.is_empty() {
            println!("   {}", card.url.dimmed());
        }
    }
}
