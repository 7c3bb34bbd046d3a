use serde::{Deserialize, Serialize};

/// Substring alias mapping a format name onto an inventory key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatAlias {
    pub pattern: String,
    pub key: String,
}

impl FormatAlias {
    pub fn new(pattern: &str, key: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Share of raw availability that may be sold (75% held back)
    pub safety_factor: f64,
    /// Population the persona ratio is measured against
    pub base_population: u64,
    pub recognised_languages: Vec<String>,
    /// Language label of rows that serve every language
    pub multi_language_marker: String,
    /// Per-language rows hold yearly totals
    pub months_per_year: f64,
    /// Checked in order after an exact key match fails
    pub aliases: Vec<FormatAlias>,
    /// Standard keys pooled for interactive formats
    pub interactive_pool: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            safety_factor: 0.25,
            base_population: 16_150_000,
            recognised_languages: vec![
                "Bahasa Malaysia".to_string(),
                "English".to_string(),
                "Chinese".to_string(),
            ],
            multi_language_marker: "multi".to_string(),
            months_per_year: 12.0,
            aliases: vec![
                FormatAlias::new("half page", "mrec"),
                FormatAlias::new("skinner", "masthead"),
                FormatAlias::new("wallpaper", "masthead"),
                FormatAlias::new("takeover", "interstitial"),
                FormatAlias::new("instream", "pre/midroll"),
                FormatAlias::new("in-stream", "pre/midroll"),
                FormatAlias::new("pre-roll", "pre/midroll"),
                FormatAlias::new("mid-roll", "pre/midroll"),
                FormatAlias::new("social image", "social image ad"),
                FormatAlias::new("image social", "social image ad"),
                FormatAlias::new("social video", "social video ad"),
                FormatAlias::new("video social", "social video ad"),
            ],
            interactive_pool: ["leaderboard", "mrec", "masthead", "interstitial", "catfish", "in-article"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}
