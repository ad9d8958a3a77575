//! Season pagination and rating extraction
//!
//! Walks the season listing pages of one series, starting at season 1, and
//! collects each season's episode titles and ratings. The site has no "number
//! of seasons" field; when asked for a season past the last one it serves the
//! last real season again. The walk therefore stops at the first page whose
//! declared season differs from the requested one, and that page is discarded.

use crate::ProgressEvent;
use crate::config::ScraperConfig;
use crate::instrument::timed;
use crate::markup::{Markup, MarkupError};
use crate::model::{Episode, Identifier, Ratings, Season};
use crate::session::{FetchError, PageFetcher};
use thiserror::Error;

/// Part of the page that holds the episode listing
const LISTING_SELECTOR: &str = "div.clear[itemscope]";

/// Heading naming the season the page shows, e.g. "Season 3"
const SEASON_HEADER_SELECTOR: &str = r#"h3#episode_top[itemprop="name"]"#;

/// Episode title links
const TITLE_SELECTOR: &str = r#"a[itemprop="name"]"#;

/// Rating nodes, see [`crate::config::RATING_STRIDE`]
const RATING_SELECTOR: &str = "span.ipl-rating-star__rating";

/// Upper end of the rating scale
const MAX_RATING: f64 = 10.0;

/// Reasons a single season page could not be processed
#[derive(Debug, Error)]
pub enum SeasonFailure {
    /// Fetching the page failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Querying the page failed
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// The page has no season heading
    #[error("season heading not found")]
    MissingSeasonHeader,

    /// The season heading carries no number
    #[error("season heading '{0}' has no season number")]
    InvalidSeasonHeader(String),

    /// The configured season cap was exceeded
    #[error("no end of seasons detected within {max} seasons")]
    SeasonLimitReached { max: u32 },
}

/// Scraping aborted. Seasons gathered before the failure are discarded.
#[derive(Debug, Error)]
#[error("Error occurred during scraping of episodes (season {season}): {cause}")]
pub struct ScrapeError {
    /// The season whose page failed
    pub season: u32,
    /// What went wrong
    #[source]
    pub cause: SeasonFailure,
}

/// Raw extraction result of one season listing page
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonPage {
    /// The season the page claims to show
    pub declared_season: u32,
    /// Episode titles in page order
    pub titles: Vec<String>,
    /// Text of every rating node, before subsampling
    pub rating_texts: Vec<String>,
}

impl SeasonPage {
    /// Extracts the season heading, titles and rating nodes from a listing page
    pub fn parse(html: &str) -> Result<Self, SeasonFailure> {
        let markup = Markup::parse(html);

        let header = markup
            .first_text(LISTING_SELECTOR, SEASON_HEADER_SELECTOR)?
            .ok_or(SeasonFailure::MissingSeasonHeader)?;
        let declared_season = parse_season_header(&header)
            .ok_or_else(|| SeasonFailure::InvalidSeasonHeader(header.trim().to_string()))?;

        let titles = markup
            .texts(LISTING_SELECTOR, TITLE_SELECTOR)?
            .into_iter()
            .map(|title| title.trim().to_string())
            .collect();

        let rating_texts = markup.texts(LISTING_SELECTOR, RATING_SELECTOR)?;

        Ok(Self {
            declared_season,
            titles,
            rating_texts,
        })
    }

    /// Ratings of this page: subsampled with `stride`, then parsed
    pub fn ratings(&self, stride: usize) -> Vec<f64> {
        parse_ratings(&subsample(&self.rating_texts, stride))
    }
}

/// First whitespace-separated token of the heading that is a number
fn parse_season_header(header: &str) -> Option<u32> {
    header
        .split_whitespace()
        .find_map(|token| token.parse::<u32>().ok())
}

/// Builds the listing URL of one season
pub fn season_url(config: &ScraperConfig, identifier: &Identifier, season: u32) -> String {
    format!(
        "{}/title/{}/episodes?season={}",
        config.base_url, identifier, season
    )
}

/// Takes every `stride`-th item, starting with the first.
///
/// A stride of 0 is treated as 1.
pub fn subsample<T: Clone>(items: &[T], stride: usize) -> Vec<T> {
    items.iter().step_by(stride.max(1)).cloned().collect()
}

/// Parses rating texts, silently dropping anything that is not a rating.
///
/// Empty or non-numeric texts and values outside 0.0 - 10.0 are skipped, so the
/// result may be shorter than the input.
pub fn parse_ratings<S: AsRef<str>>(texts: &[S]) -> Vec<f64> {
    texts
        .iter()
        .filter_map(|text| text.as_ref().trim().parse::<f64>().ok())
        .filter(|rating| rating.is_finite() && (0.0..=MAX_RATING).contains(rating))
        .collect()
}

/// Pairs titles and ratings by position, up to the shorter of the two.
///
/// Trailing titles without a rating (or ratings without a title) are dropped.
pub fn reconcile(titles: &[String], ratings: &[f64]) -> Vec<Episode> {
    titles
        .iter()
        .zip(ratings)
        .map(|(title, rating)| Episode {
            title: title.clone(),
            rating: *rating,
        })
        .collect()
}

/// Scrapes all seasons of a series
///
/// # Errors
///
/// Any failure other than the end-of-seasons condition aborts the whole
/// extraction with a [`ScrapeError`].
pub fn extract<F>(fetcher: &F, config: &ScraperConfig, identifier: &Identifier) -> Result<Ratings, ScrapeError>
where
    F: PageFetcher + ?Sized,
{
    extract_with_progress(fetcher, config, identifier, &mut |_: ProgressEvent| {})
}

/// Like [`extract`], reporting each season through `progress`
pub(crate) fn extract_with_progress<F>(
    fetcher: &F,
    config: &ScraperConfig,
    identifier: &Identifier,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Result<Ratings, ScrapeError>
where
    F: PageFetcher + ?Sized,
{
    timed("extract", || {
        let mut ratings = Ratings::new();
        let mut season = 0;

        loop {
            season += 1;

            let page = fetch_season(fetcher, config, identifier, season)
                .map_err(|cause| ScrapeError { season, cause })?;

            if page.declared_season != season {
                tracing::debug!(
                    %identifier,
                    requested = season,
                    declared = page.declared_season,
                    "End of seasons reached"
                );
                break;
            }

            // The page past the cap is still fetched, it may be the end marker
            if season > config.max_seasons {
                return Err(ScrapeError {
                    season,
                    cause: SeasonFailure::SeasonLimitReached {
                        max: config.max_seasons,
                    },
                });
            }

            let season_ratings = page.ratings(config.rating_stride);
            if season_ratings.is_empty() {
                tracing::warn!(%identifier, season, "Season has no ratings, skipping");
                progress(ProgressEvent::SeasonSkipped { season });
                continue;
            }

            let episodes = reconcile(&page.titles, &season_ratings);
            if page.titles.len() != season_ratings.len() {
                tracing::debug!(
                    season,
                    titles = page.titles.len(),
                    ratings = season_ratings.len(),
                    "Title and rating counts differ, truncating"
                );
            }

            tracing::info!(%identifier, season, episodes = episodes.len(), "Scraping Season {}", season);
            progress(ProgressEvent::SeasonScraped {
                season,
                episode_count: episodes.len(),
            });

            ratings.push(Season { season, episodes });
        }

        Ok(ratings)
    })
}

fn fetch_season<F>(
    fetcher: &F,
    config: &ScraperConfig,
    identifier: &Identifier,
    season: u32,
) -> Result<SeasonPage, SeasonFailure>
where
    F: PageFetcher + ?Sized,
{
    let page = fetcher.fetch_page(&season_url(config, identifier, season))?;
    SeasonPage::parse(&page)
}
