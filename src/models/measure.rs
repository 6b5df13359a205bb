//! Measure data structure.

use serde::{Deserialize, Serialize};

/// A support measure extracted from the watched page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Measure {
    /// Absolute URL of the measure page; the deduplication key
    pub url: String,

    /// Measure title (empty if the page omits one)
    pub title: String,
}

impl Measure {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// The two-line announcement sent when the measure is first seen.
    pub fn announcement(&self) -> String {
        format!("New page added: {}\nTitle: {}", self.url, self.title)
    }
}
