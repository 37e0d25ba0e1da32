//! VADER sentiment boosted with market vocabulary, used when no hosted model
//! is configured.

use vader_sentiment::SentimentIntensityAnalyzer;

/// Market terms VADER's general-purpose lexicon underweights or misses.
const BULLISH_TERMS: &[(&str, f64)] = &[
    ("bullish", 0.5),
    ("surge", 0.4),
    ("soar", 0.5),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("jump", 0.3),
    ("record high", 0.5),
    ("all-time high", 0.5),
    ("record profit", 0.4),
    ("beats estimates", 0.4),
    ("beat estimates", 0.4),
    ("outperform", 0.4),
    ("upgrade", 0.3),
    ("buyback", 0.3),
    ("dividend", 0.2),
    ("breakthrough", 0.4),
    ("rebound", 0.3),
    ("strong growth", 0.3),
    ("raises guidance", 0.4),
    ("tailwind", 0.3),
];

const BEARISH_TERMS: &[(&str, f64)] = &[
    ("bearish", -0.5),
    ("crash", -0.5),
    ("plunge", -0.5),
    ("tumble", -0.4),
    ("slump", -0.4),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("downgrade", -0.4),
    ("underperform", -0.4),
    ("misses estimates", -0.4),
    ("missed estimates", -0.4),
    ("cuts guidance", -0.4),
    ("weak guidance", -0.4),
    ("lawsuit", -0.4),
    ("investigation", -0.3),
    ("recall", -0.4),
    ("layoffs", -0.3),
    ("bankruptcy", -0.6),
    ("headwind", -0.3),
    ("fraud", -0.5),
];

/// Share of the keyword boost added to VADER's compound score.
const BOOST_WEIGHT: f64 = 0.5;

pub struct FinancialLexicon {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl Default for FinancialLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl FinancialLexicon {
    pub fn new() -> Self {
        Self { analyzer: SentimentIntensityAnalyzer::new() }
    }

    /// VADER compound score plus the weighted keyword boost, in [-1, 1].
    pub fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let compound = self.analyzer.polarity_scores(text)["compound"];
        (compound + keyword_boost(text) * BOOST_WEIGHT).clamp(-1.0, 1.0)
    }
}

fn keyword_boost(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    BULLISH_TERMS
        .iter()
        .chain(BEARISH_TERMS)
        .filter(|(term, _)| lowered.contains(term))
        .map(|(_, weight)| weight)
        .sum()
}
