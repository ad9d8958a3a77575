//! HTTP session module
//!
//! This module provides the transport used by the resolver and the season
//! extractor. Both only ever need "give me the body behind this URL", which is
//! captured by the [`PageFetcher`] trait. [`Session`] is the real
//! implementation: one blocking HTTP client created at startup and reused for
//! every request, so connections are kept alive between season pages.

use crate::config::ScraperConfig;
use std::error::Error as StdError;
use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// TLS handshake or certificate validation failed
    #[error("SSL certificate error: {0}")]
    Certificate(String),

    /// The host could not be reached
    #[error("No network connection: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// The site answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Any other failure while sending the request or reading the body
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Classifies a reqwest error by walking its source chain
    fn classify(url: &str, error: reqwest::Error) -> Self {
        if mentions_certificate(&error) {
            return FetchError::Certificate(root_cause(&error));
        }
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
            };
        }
        if error.is_connect() {
            return FetchError::Connection(root_cause(&error));
        }
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Checks whether any cause below `error` talks about certificates or TLS.
///
/// The top-level message is skipped since it embeds the request URL.
fn mentions_certificate(error: &(dyn StdError + 'static)) -> bool {
    let mut current = error.source();
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if message.contains("certificate") || message.contains("tls") {
            return true;
        }
        current = err.source();
    }
    false
}

/// Message of the innermost error in the chain
fn root_cause(error: &(dyn StdError + 'static)) -> String {
    let mut current = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

/// Anything that can turn a URL into a page body.
///
/// Implemented by [`Session`] for real requests; tests plug in canned pages.
pub trait PageFetcher {
    /// Fetches `url` and returns the response body as text
    fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Reusable HTTP session.
///
/// Create one per process (or per server) and hand it to every pipeline run.
/// It carries no state besides the connection pool.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::blocking::Client,
}

impl Session {
    /// Builds a session with the user agent and timeout from `config`
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::classify(&config.base_url, e))?;

        Ok(Self { client })
    }
}

impl PageFetcher for Session {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::classify(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response.text().map_err(|e| FetchError::classify(url, e))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_distinguish_causes() {
        let cert = FetchError::Certificate("unknown issuer".into()).to_string();
        let conn = FetchError::Connection("connection refused".into()).to_string();
        assert!(cert.starts_with("SSL certificate error"));
        assert!(conn.starts_with("No network connection"));
    }

    #[test]
    fn test_connection_refused_is_connection_error() {
        let config = ScraperConfig {
            timeout: std::time::Duration::from_secs(2),
            ..ScraperConfig::default()
        };
        let session = Session::new(&config).unwrap();

        // Port 9 (discard) on localhost is closed on any sane test machine
        let result = session.fetch_page("http://127.0.0.1:9/");
        assert!(matches!(result, Err(FetchError::Connection(_))));
    }
}
