//! Identifier resolution
//!
//! Turns a free-text series title into the site's series id by running a
//! search and taking the first result. Ambiguous titles are not disambiguated:
//! whatever the site ranks first wins.

use crate::config::ScraperConfig;
use crate::instrument::timed;
use crate::markup::{Markup, MarkupError};
use crate::model::Identifier;
use crate::session::{FetchError, PageFetcher};
use thiserror::Error;

/// Container of one search result
const RESULT_SELECTOR: &str = "div.ipc-metadata-list-summary-item__tc";

/// Link to the result's title page, searched inside [`RESULT_SELECTOR`]
const RESULT_LINK_SELECTOR: &str = "a[href]";

/// Errors that can occur while resolving a title
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The title was empty
    #[error("No series title given")]
    EmptyTitle,

    /// The search page had no usable result
    #[error("No valid IMDb ID found for '{title}'")]
    NotFound { title: String },

    /// The search request failed
    #[error(transparent)]
    Transport(#[from] FetchError),

    /// The search page could not be queried
    #[error("Failed to read search results: {0}")]
    Markup(#[from] MarkupError),
}

/// Builds the search URL for `title`.
///
/// Whitespace runs become `+`, everything else is percent-encoded.
pub fn search_url(config: &ScraperConfig, title: &str) -> String {
    let query = title
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+");

    format!("{}/find?q={}&ref_=nv_sr_sm", config.base_url, query)
}

/// Extracts the id from a result link such as `/title/tt0903747/?ref_=fn_al_tt_1`.
///
/// The id is the third `/`-separated component of the link.
pub fn identifier_from_href(href: &str) -> Option<Identifier> {
    href.split('/').nth(2).and_then(Identifier::new)
}

/// Extracts the id of the first search result from a search page
pub fn identifier_from_search_page(html: &str) -> Result<Option<Identifier>, MarkupError> {
    let markup = Markup::parse(html);
    let href = markup.first_attr(RESULT_SELECTOR, RESULT_LINK_SELECTOR, "href")?;

    Ok(href.as_deref().and_then(identifier_from_href))
}

/// Resolves a series title to its id with a single search request
///
/// # Errors
///
/// Returns [`ResolveError::NotFound`] when the search page contains no result
/// or the first result's link does not carry an id, and
/// [`ResolveError::Transport`] when the request itself fails.
pub fn resolve<F>(fetcher: &F, config: &ScraperConfig, title: &str) -> Result<Identifier, ResolveError>
where
    F: PageFetcher + ?Sized,
{
    timed("resolve", || {
        if title.trim().is_empty() {
            return Err(ResolveError::EmptyTitle);
        }

        let url = search_url(config, title);
        tracing::debug!(%url, "Searching for series");

        let page = fetcher.fetch_page(&url).inspect_err(|e| {
            tracing::warn!(title, error = %e, "Search request failed");
        })?;

        match identifier_from_search_page(&page)? {
            Some(identifier) => {
                tracing::info!(title, %identifier, "Found IMDb ID: {}", identifier);
                Ok(identifier)
            }
            None => {
                tracing::warn!(title, "No IMDb ID found in search results");
                Err(ResolveError::NotFound {
                    title: title.to_string(),
                })
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::ScriptedFetcher;

    const BASE: &str = "http://imdb.test";

    fn config() -> ScraperConfig {
        ScraperConfig::default().with_base_url(BASE)
    }

    fn search_page(hrefs: &[&str]) -> String {
        let results: String = hrefs
            .iter()
            .map(|href| {
                format!(
                    r#"<li><div class="ipc-metadata-list-summary-item__tc">
                        <a class="ipc-metadata-list-summary-item__t" href="{}">Result</a>
                    </div></li>"#,
                    href
                )
            })
            .collect();
        format!("<html><body><ul>{}</ul></body></html>", results)
    }

    #[test]
    fn test_search_url_encodes_title() {
        assert_eq!(
            search_url(&config(), "Example Show"),
            "http://imdb.test/find?q=Example+Show&ref_=nv_sr_sm"
        );
        assert_eq!(
            search_url(&config(), "  Law &  Order "),
            "http://imdb.test/find?q=Law+%26+Order&ref_=nv_sr_sm"
        );
    }

    #[test]
    fn test_identifier_from_href() {
        assert_eq!(
            identifier_from_href("/title/tt0903747/?ref_=fn_al_tt_1").unwrap().as_str(),
            "tt0903747"
        );
        assert!(identifier_from_href("/title/").is_none());
        assert!(identifier_from_href("tt0903747").is_none());
    }

    #[test]
    fn test_first_result_wins() {
        let page = search_page(&["/title/tt1111111/?ref_=fn", "/title/tt2222222/?ref_=fn"]);
        let id = identifier_from_search_page(&page).unwrap().unwrap();
        assert_eq!(id.as_str(), "tt1111111");
    }

    #[test]
    fn test_resolve_example_show() {
        let fetcher = ScriptedFetcher::new().page(
            "http://imdb.test/find?q=Example+Show&ref_=nv_sr_sm",
            search_page(&["/title/tt1234567/?ref_=fn_al_tt_1"]),
        );

        let id = resolve(&fetcher, &config(), "Example Show").unwrap();
        assert_eq!(id.as_str(), "tt1234567");
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[test]
    fn test_resolve_without_results_is_not_found() {
        let fetcher = ScriptedFetcher::new().page(
            "http://imdb.test/find?q=Nothing&ref_=nv_sr_sm",
            "<html><body><p>No results found</p></body></html>",
        );

        let result = resolve(&fetcher, &config(), "Nothing");
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
        assert_eq!(fetcher.requests().len(), 1, "no further requests after a miss");
    }

    #[test]
    fn test_resolve_malformed_link_is_not_found() {
        let fetcher = ScriptedFetcher::new().page(
            "http://imdb.test/find?q=Broken&ref_=nv_sr_sm",
            search_page(&["tt1234567"]),
        );

        let result = resolve(&fetcher, &config(), "Broken");
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    }

    #[test]
    fn test_resolve_empty_title_sends_nothing() {
        let fetcher = ScriptedFetcher::new();
        let result = resolve(&fetcher, &config(), "   ");
        assert!(matches!(result, Err(ResolveError::EmptyTitle)));
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn test_resolve_transport_failures() {
        let fetcher = ScriptedFetcher::new()
            .failing("http://imdb.test/find?q=Tls&ref_=nv_sr_sm", || {
                FetchError::Certificate("invalid peer certificate".into())
            })
            .failing("http://imdb.test/find?q=Offline&ref_=nv_sr_sm", || {
                FetchError::Connection("connection refused".into())
            });

        let tls = resolve(&fetcher, &config(), "Tls").unwrap_err();
        assert!(matches!(tls, ResolveError::Transport(FetchError::Certificate(_))));
        assert!(tls.to_string().starts_with("SSL certificate error"));

        let offline = resolve(&fetcher, &config(), "Offline").unwrap_err();
        assert!(matches!(offline, ResolveError::Transport(FetchError::Connection(_))));
        assert!(offline.to_string().starts_with("No network connection"));
    }
}
