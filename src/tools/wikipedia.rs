//! Encyclopedia search via the MediaWiki API
//!
//! One request runs a full-text search and returns the plain-text intro of
//! each matching page along with its canonical URL.

use crate::tools::normalize_content;
use crate::tools::registry::SearchTool;
use crate::types::{AppError, Result, SearchEngine, SearchResult};
use crate::utils::toml_config::BackendConfig;
use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_MAX_RESULTS: usize = 3;

pub struct WikipediaSearch {
    http: reqwest::Client,
    api_url: String,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    index: u32,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: Option<String>,
}

impl WikipediaSearch {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, max_results: usize) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            max_results,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &BackendConfig) -> Self {
        Self::new(
            http,
            config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            config.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        )
    }

    fn page_url(title: &str) -> String {
        format!(
            "https://en.wikipedia.org/wiki/{}",
            title.replace(' ', "_")
        )
    }
}

#[async_trait]
impl SearchTool for WikipediaSearch {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Wiki
    }

    fn description(&self) -> &str {
        "Search Wikipedia for the given query. Best for general knowledge and historical \
         summaries with human-curated content."
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let limit = self.max_results.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", "max"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::tool(self.engine().tool_name(), e))?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::tool(self.engine().tool_name(), e))?;

        let mut pages = body.query.map(|q| q.pages).unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        Ok(pages
            .into_iter()
            .take(self.max_results)
            .map(|page| SearchResult {
                search_query: query.to_string(),
                source: page.fullurl.unwrap_or_else(|| Self::page_url(&page.title)),
                content: normalize_content(&page.extract),
                title: page.title,
                search_engine: SearchEngine::Wiki,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_fallback() {
        assert_eq!(
            WikipediaSearch::page_url("Rust (programming language)"),
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
    }

    #[test]
    fn test_pages_deserialize_without_query() {
        let body: QueryResponse = serde_json::from_str(r#"{"batchcomplete": true}"#).unwrap();
        assert!(body.query.is_none());
    }

    #[test]
    fn test_defaults_from_config() {
        let search = WikipediaSearch::from_config(reqwest::Client::new(), &BackendConfig::default());
        assert_eq!(search.api_url, DEFAULT_API_URL);
        assert_eq!(search.max_results, 3);
    }
}
