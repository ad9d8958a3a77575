//! Episode Ratings - scrape per-episode ratings of a tv series
//!
//! This library resolves a free-text series title to the site's series id,
//! walks the series' season listing pages and assembles the episode ratings
//! into a season-ordered structure. The result can be charted in the terminal
//! or served as JSON over HTTP.

mod config;
mod extractor;
mod instrument;
mod markup;
mod model;
mod plot;
mod resolver;
pub mod server;
mod session;
mod table;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_SEASONS, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, RATING_STRIDE,
    ScraperArgs, ScraperConfig,
};
pub use extractor::{
    SeasonPage, extract, parse_ratings, reconcile, season_url, subsample,
};
pub use model::{Episode, Identifier, Ratings, Season};
pub use plot::{PlotOptions, render};
pub use resolver::{identifier_from_href, identifier_from_search_page, resolve, search_url};
pub use session::{PageFetcher, Session};
pub use table::{RatingRow, flatten, mean_rating, trend_line};

// Re-export error types
pub use extractor::{ScrapeError, SeasonFailure};
pub use markup::MarkupError;
pub use resolver::ResolveError;
pub use session::FetchError;

use thiserror::Error;

/// Progress event emitted while ratings are fetched
///
/// These events allow library users to track progress and provide feedback
/// during a run that may take one request per season.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Searching for the series
    Resolving { title: String },

    /// Series id found
    Resolved { identifier: Identifier },

    /// A season page was scraped and added to the result
    SeasonScraped { season: u32, episode_count: usize },

    /// A season page had no ratings and was left out
    SeasonSkipped { season: u32 },

    /// All seasons fetched
    Complete { season_count: usize },
}

/// Top-level error type for rating retrieval
///
/// Displays as the underlying error's message, which is what the HTTP
/// interface returns to clients.
#[derive(Debug, Error)]
pub enum RatingsError {
    /// The title could not be resolved to a series id
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Scraping the season pages failed
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Fetches the episode ratings of a series by title
///
/// Resolves `title` with one search request, then scrapes season pages until
/// the site signals the end of the series. The session (or any other
/// [`PageFetcher`]) is borrowed for the whole run.
///
/// # Arguments
///
/// * `fetcher` - Transport used for every request, usually a [`Session`]
/// * `config` - Site URL, stride and season cap
/// * `title` - Free-text series title, the first search hit is used
/// * `progress_callback` - Closure called with progress events (can be empty for silent operation)
///
/// # Returns
///
/// The seasons with at least one rated episode, in ascending order
///
/// # Examples
///
/// ```no_run
/// use episode_ratings::{fetch_ratings, ProgressEvent, ScraperConfig, Session};
///
/// let config = ScraperConfig::default();
/// let session = Session::new(&config).unwrap();
///
/// let ratings = fetch_ratings(&session, &config, "Breaking Bad", |event| {
///     if let ProgressEvent::SeasonScraped { season, episode_count } = event {
///         println!("Season {}: {} episodes", season, episode_count);
///     }
/// })
/// .unwrap();
/// ```
pub fn fetch_ratings<F, P>(
    fetcher: &F,
    config: &ScraperConfig,
    title: &str,
    mut progress_callback: P,
) -> Result<Ratings, RatingsError>
where
    F: PageFetcher + ?Sized,
    P: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Resolving {
        title: title.to_string(),
    });

    let identifier = resolve(fetcher, config, title)?;

    progress_callback(ProgressEvent::Resolved {
        identifier: identifier.clone(),
    });

    let ratings =
        extractor::extract_with_progress(fetcher, config, &identifier, &mut progress_callback)?;

    progress_callback(ProgressEvent::Complete {
        season_count: ratings.len(),
    });

    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RATING_STRIDE;
    use crate::extractor::fixtures::season_page;
    use crate::session::testing::ScriptedFetcher;

    const SEARCH: &str = r#"<div class="ipc-metadata-list-summary-item__tc">
        <a href="/title/tt1234567/?ref_=fn_al_tt_1">Example Show</a></div>"#;

    fn config() -> ScraperConfig {
        ScraperConfig::default().with_base_url("http://imdb.test")
    }

    #[test]
    fn test_fetch_ratings_example_show() {
        let fetcher = ScriptedFetcher::new()
            .page("http://imdb.test/find?q=Example+Show&ref_=nv_sr_sm", SEARCH)
            .page(
                "http://imdb.test/title/tt1234567/episodes?season=1",
                season_page(1, &[("Pilot", "8.1"), ("Episode Two", "7.9")], RATING_STRIDE),
            )
            .page(
                "http://imdb.test/title/tt1234567/episodes?season=2",
                season_page(1, &[("Pilot", "8.1"), ("Episode Two", "7.9")], RATING_STRIDE),
            );

        let mut events = Vec::new();
        let ratings = fetch_ratings(&fetcher, &config(), "Example Show", |e| events.push(e)).unwrap();

        assert_eq!(
            ratings,
            vec![Season {
                season: 1,
                episodes: vec![
                    Episode {
                        title: "Pilot".into(),
                        rating: 8.1
                    },
                    Episode {
                        title: "Episode Two".into(),
                        rating: 7.9
                    },
                ],
            }]
        );

        assert_eq!(
            events,
            vec![
                ProgressEvent::Resolving {
                    title: "Example Show".into()
                },
                ProgressEvent::Resolved {
                    identifier: Identifier::new("tt1234567").unwrap()
                },
                ProgressEvent::SeasonScraped {
                    season: 1,
                    episode_count: 2
                },
                ProgressEvent::Complete { season_count: 1 },
            ]
        );
    }

    #[test]
    fn test_fetch_ratings_through_trait_object() {
        let scripted = ScriptedFetcher::new()
            .page("http://imdb.test/find?q=Example+Show&ref_=nv_sr_sm", SEARCH)
            .page(
                "http://imdb.test/title/tt1234567/episodes?season=1",
                season_page(1, &[("Pilot", "8.1")], RATING_STRIDE),
            )
            .page(
                "http://imdb.test/title/tt1234567/episodes?season=2",
                season_page(1, &[("Pilot", "8.1")], RATING_STRIDE),
            );
        let fetcher: &dyn PageFetcher = &scripted;

        let ratings = fetch_ratings(fetcher, &config(), "Example Show", |_| {}).unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(scripted.requests().len(), 3);
    }

    #[test]
    fn test_not_found_stops_before_scraping() {
        let fetcher = ScriptedFetcher::new()
            .page("http://imdb.test/find?q=Nothing&ref_=nv_sr_sm", "<html></html>");

        let error = fetch_ratings(&fetcher, &config(), "Nothing", |_| {}).unwrap_err();
        assert!(matches!(
            error,
            RatingsError::Resolve(ResolveError::NotFound { .. })
        ));
        assert_eq!(error.to_string(), "No valid IMDb ID found for 'Nothing'");
        assert_eq!(fetcher.requests().len(), 1);
    }
}
