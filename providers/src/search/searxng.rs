//! SearXNG backend
//!
//! See: https://docs.searxng.org/dev/search_api.html

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchBackend, SearchResult, SearchResults};
use crate::config::SearchSection;

/// SearXNG backend
pub struct SearXNGBackend {
    client: Client,
    url: String,
    engines: String,
}

impl SearXNGBackend {
    pub fn new(config: &SearchSection) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("agent-swarm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            engines: config.engines.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearXNGResponse {
    results: Vec<SearXNGResult>,
}

#[derive(Debug, Deserialize)]
struct SearXNGResult {
    title: String,
    url: String,
    content: Option<String>,
    img_src: Option<String>,
}

fn into_results(response: SearXNGResponse, limit: usize) -> Vec<SearchResult> {
    response
        .results
        .into_iter()
        // Image-only hits carry a non-empty img_src
        .filter(|r| r.img_src.as_ref().map_or(true, |s| s.is_empty()))
        .take(limit)
        .map(|r| SearchResult {
            title: r.title,
            url: r.url,
            description: r.content.unwrap_or_default(),
        })
        .collect()
}

#[async_trait]
impl SearchBackend for SearXNGBackend {
    fn name(&self) -> &str {
        "searxng"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults> {
        if self.url.is_empty() {
            return Err(anyhow!("SearXNG URL not configured"));
        }

        let mut params = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("pageno", "1".to_string()),
        ];

        if !self.engines.is_empty() {
            params.push(("engines", self.engines.clone()));
        }

        let response = self
            .client
            .get(format!("{}/search", self.url))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("SearXNG error {}: {}", status, text));
        }

        let searxng_response: SearXNGResponse = response.json().await?;
        let results = into_results(searxng_response, limit);

        tracing::debug!(query, count = results.len(), "SearXNG search completed");

        Ok(SearchResults {
            query: query.to_string(),
            results,
            backend: self.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_results_filters_images_and_limits() {
        let response: SearXNGResponse = serde_json::from_str(
            r#"{
                "results": [
                    {"title": "Img", "url": "https://i.example", "img_src": "https://i.example/x.png"},
                    {"title": "One", "url": "https://1.example", "content": "first", "img_src": ""},
                    {"title": "Two", "url": "https://2.example"},
                    {"title": "Three", "url": "https://3.example", "content": "third"}
                ]
            }"#,
        )
        .unwrap();

        let results = into_results(response, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "One");
        assert_eq!(results[0].description, "first");
        assert_eq!(results[1].title, "Two");
        assert_eq!(results[1].description, "");
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let config = SearchSection {
            url: String::new(),
            ..Default::default()
        };
        let backend = SearXNGBackend::new(&config).unwrap();
        assert!(backend.search("anything", 5).await.is_err());
    }
}
