//! Scraper configuration
//!
//! Holds the knobs of the scraping pipeline. The defaults describe the one page
//! structure the extraction rules are written against; changing the site
//! template usually means changing a value here.

use clap::Args;
use std::time::Duration;

/// Base URL of the site that is searched and scraped
pub const DEFAULT_BASE_URL: &str = "https://www.imdb.com";

/// User-Agent sent with every request.
///
/// The site rejects some well-known default agents, any custom value will do.
pub const DEFAULT_USER_AGENT: &str = concat!("episode-ratings/", env!("CARGO_PKG_VERSION"));

/// Timeout applied to each request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of `ipl-rating-star__rating` nodes the season listing emits per episode.
///
/// Only the first node of every block carries the episode's rating, the rest
/// belong to the rating widget. This is a property of the page template and
/// will break whenever that template changes.
pub const RATING_STRIDE: usize = 23;

/// Highest season number that is requested before the extraction gives up
pub const DEFAULT_MAX_SEASONS: u32 = 100;

/// Configuration shared by the resolver and the season extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    /// Scheme and host of the site, without trailing slash
    pub base_url: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Take every n-th rating node, starting at the first
    pub rating_stride: usize,
    /// Upper bound for the season counter
    pub max_seasons: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            rating_stride: RATING_STRIDE,
            max_seasons: DEFAULT_MAX_SEASONS,
        }
    }
}

impl ScraperConfig {
    /// Replaces the base URL, dropping any trailing slash
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Command-line and environment options shared by both binaries
#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    /// Base URL of the scraped site
    #[arg(long, env = "RATINGS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[arg(long, env = "RATINGS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "RATINGS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Give up when no end of seasons is found within this many seasons
    #[arg(long, env = "RATINGS_MAX_SEASONS", default_value_t = DEFAULT_MAX_SEASONS)]
    pub max_seasons: u32,
}

impl From<ScraperArgs> for ScraperConfig {
    fn from(args: ScraperArgs) -> Self {
        ScraperConfig {
            user_agent: args.user_agent,
            timeout: Duration::from_secs(args.timeout_secs),
            max_seasons: args.max_seasons,
            ..ScraperConfig::default()
        }
        .with_base_url(args.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url, "https://www.imdb.com");
        assert_eq!(config.rating_stride, 23);
        assert_eq!(config.max_seasons, DEFAULT_MAX_SEASONS);
        assert!(config.user_agent.starts_with("episode-ratings/"));
    }

    #[test]
    fn test_config_from_args() {
        let args = ScraperArgs {
            base_url: "http://localhost:9000/".to_string(),
            user_agent: "tests".to_string(),
            timeout_secs: 5,
            max_seasons: 12,
        };

        let config = ScraperConfig::from(args);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.user_agent, "tests");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_seasons, 12);
        assert_eq!(config.rating_stride, RATING_STRIDE);
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let config = ScraperConfig::default().with_base_url("http://localhost:8080/");
        assert_eq!(config.base_url, "http://localhost:8080");
    }
}
