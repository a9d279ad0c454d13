//! Web search backends
//!
//! Search results are never consumed by the crew directly. They are rendered
//! into literal text and appended to a task description before prompt
//! composition.

use std::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod searxng;

pub use searxng::SearXNGBackend;

/// A single web search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result
    pub title: String,
    /// The URL of the result
    pub url: String,
    /// A description or snippet of the result
    pub description: String,
}

/// A collection of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The search query that was executed
    pub query: String,
    /// The search results
    pub results: Vec<SearchResult>,
    /// The backend that was used
    pub backend: String,
}

impl SearchResults {
    /// Render the results as a literal context block
    pub fn to_context(&self) -> String {
        let mut out = format!("Web search results for \"{}\":\n", self.query);

        if self.results.is_empty() {
            out.push_str("(no results)\n");
            return out;
        }

        for (i, result) in self.results.iter().enumerate() {
            let _ = writeln!(out, "{}. {} ({})", i + 1, result.title, result.url);
            if !result.description.is_empty() {
                let _ = writeln!(out, "   {}", result.description);
            }
        }

        out
    }
}

/// Trait for search backends
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &str;

    /// Perform a web search
    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults>;
}
