//! Academic paper search via the arXiv Atom API

use crate::tools::normalize_content;
use crate::tools::registry::SearchTool;
use crate::types::{AppError, Result, SearchEngine, SearchResult};
use crate::utils::toml_config::BackendConfig;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

pub const DEFAULT_API_URL: &str = "https://export.arxiv.org/api/query";
const DEFAULT_MAX_RESULTS: usize = 3;

pub struct ArxivSearch {
    http: reqwest::Client,
    api_url: String,
    max_results: usize,
}

impl ArxivSearch {
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
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Internal(format!("Invalid selector '{}': {}", css, e)))
}

fn child_text(entry: &ElementRef<'_>, sel: &Selector) -> String {
    entry
        .select(sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Extract search results from an Atom feed.
///
/// Entries without an id are skipped; the id is the paper's abstract URL.
pub fn parse_feed(feed: &str, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(feed);
    let entry_sel = selector("entry")?;
    let title_sel = selector("title")?;
    let id_sel = selector("id")?;
    let summary_sel = selector("summary")?;

    Ok(document
        .select(&entry_sel)
        .filter_map(|entry| {
            let source = child_text(&entry, &id_sel);
            if source.is_empty() {
                return None;
            }
            Some(SearchResult {
                search_query: query.to_string(),
                title: normalize_content(&child_text(&entry, &title_sel)),
                source,
                content: normalize_content(&child_text(&entry, &summary_sel)),
                search_engine: SearchEngine::Academic,
            })
        })
        .take(max_results)
        .collect())
}

#[async_trait]
impl SearchTool for ArxivSearch {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Academic
    }

    fn description(&self) -> &str {
        "Search arXiv for the given query. Best for academic research, technical papers and \
         recent scientific studies in fields like ML, physics and mathematics."
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let tool = self.engine().tool_name();
        let max_results = self.max_results.to_string();
        let search_query = format!("all:{}", query);

        let feed = self
            .http
            .get(&self.api_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::tool(tool, e))?
            .text()
            .await
            .map_err(|e| AppError::tool(tool, e))?;

        parse_feed(&feed, query, self.max_results).map_err(|e| AppError::tool(tool, e))
    }
}
