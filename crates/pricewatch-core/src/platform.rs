use serde::{Deserialize, Serialize};

/// A quick-commerce platform we scrape listings from.
///
/// The string form (serde and `Display`) is the kebab-case key used in
/// snapshot rows and API payloads, e.g. `"flipkart-minutes"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Zepto,
    Blinkit,
    Jiomart,
    Dmart,
    FlipkartMinutes,
    Instamart,
}

impl Platform {
    /// Fixed processing order for cross-platform merging.
    ///
    /// Greedy matching is order-dependent; tests and callers pin this order
    /// rather than assuming a canonical one.
    pub const MERGE_PRIORITY: [Platform; 6] = [
        Platform::Zepto,
        Platform::Blinkit,
        Platform::Jiomart,
        Platform::Dmart,
        Platform::FlipkartMinutes,
        Platform::Instamart,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Zepto => "zepto",
            Platform::Blinkit => "blinkit",
            Platform::Jiomart => "jiomart",
            Platform::Dmart => "dmart",
            Platform::FlipkartMinutes => "flipkart-minutes",
            Platform::Instamart => "instamart",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zepto" => Ok(Platform::Zepto),
            "blinkit" => Ok(Platform::Blinkit),
            "jiomart" => Ok(Platform::Jiomart),
            "dmart" => Ok(Platform::Dmart),
            "flipkart-minutes" => Ok(Platform::FlipkartMinutes),
            "instamart" => Ok(Platform::Instamart),
            other => Err(crate::ConfigError::UnknownPlatform(other.to_string())),
        }
    }
}
