// src/services/extractor.rs

//! Measure extraction from page markup.
//!
//! Locates listed items using the configured CSS selectors and turns them
//! into [`Measure`] values in document order.

use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Measure, SelectorConfig};
use crate::utils::resolve_url;

/// Extracts measures from the watched page's HTML.
pub struct MeasureExtractor {
    item_selector: Selector,
    title_selector: Selector,
    link_attr: String,
    base_url: Url,
}

impl MeasureExtractor {
    /// Build an extractor for the given selectors, resolving relative
    /// links against `base_url`.
    pub fn new(selectors: &SelectorConfig, base_url: &str) -> Result<Self> {
        Ok(Self {
            item_selector: parse_selector(&selectors.item_selector)?,
            title_selector: parse_selector(&selectors.title_selector)?,
            link_attr: selectors.link_attr.clone(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Extract all measures from `html`, in document order.
    ///
    /// A matched node missing its link attribute or title node is dropped
    /// with a diagnostic; the rest of the batch continues. A page with no
    /// matching nodes yields an empty vec.
    pub fn extract(&self, html: &str) -> Vec<Measure> {
        let document = Html::parse_document(html);
        let mut measures = Vec::new();

        for item in document.select(&self.item_selector) {
            let Some(href) = item.value().attr(&self.link_attr) else {
                log::warn!(
                    "Skipping item without '{}' attribute: {}",
                    self.link_attr,
                    item.html()
                );
                continue;
            };
            if href.trim().is_empty() {
                log::warn!("Skipping item with empty '{}' attribute", self.link_attr);
                continue;
            }

            let Some(title_elem) = item.select(&self.title_selector).next() else {
                log::warn!("Skipping item without title node: {href}");
                continue;
            };

            let raw_title: String = title_elem.text().collect();
            let title = normalize_whitespace(&raw_title);
            let url = resolve_url(&self.base_url, href);

            measures.push(Measure::new(url, title));
        }

        measures
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
