//! Markup queries
//!
//! Thin layer over `scraper`: every query is "inside each element matching a
//! scope selector, find the elements matching a target selector". Limiting
//! queries to a scope keeps unrelated parts of the page out of the result.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors that can occur while querying markup
#[derive(Debug, Error)]
pub enum MarkupError {
    /// A CSS selector could not be compiled
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// A parsed HTML document
pub(crate) struct Markup {
    document: Html,
}

impl Markup {
    /// Parses a full HTML document. Parsing never fails, broken markup is repaired.
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Text of every `target` element inside every `scope` element, in document order
    pub fn texts(&self, scope: &str, target: &str) -> Result<Vec<String>, MarkupError> {
        Ok(self
            .scoped(scope, target)?
            .into_iter()
            .map(|element| element.text().collect::<String>())
            .collect())
    }

    /// Text of the first `target` element inside the `scope` elements
    pub fn first_text(&self, scope: &str, target: &str) -> Result<Option<String>, MarkupError> {
        Ok(self
            .scoped(scope, target)?
            .into_iter()
            .next()
            .map(|element| element.text().collect::<String>()))
    }

    /// Attribute `attr` of the first `target` element inside the first `scope` element
    pub fn first_attr(
        &self,
        scope: &str,
        target: &str,
        attr: &str,
    ) -> Result<Option<String>, MarkupError> {
        let scope_selector = compile(scope)?;
        let target_selector = compile(target)?;

        let Some(container) = self.document.select(&scope_selector).next() else {
            return Ok(None);
        };

        Ok(container
            .select(&target_selector)
            .next()
            .and_then(|element| element.value().attr(attr))
            .map(|value| value.to_string()))
    }

    /// Each matching element once, even when scope elements are nested
    fn scoped(&self, scope: &str, target: &str) -> Result<Vec<ElementRef<'_>>, MarkupError> {
        let selector = compile(&format!("{} {}", scope, target))?;
        Ok(self.document.select(&selector).collect())
    }
}

fn compile(selector: &str) -> Result<Selector, MarkupError> {
    Selector::parse(selector).map_err(|e| MarkupError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
