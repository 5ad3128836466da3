//! Search Backends
//!
//! The three search tools the language model can call while researching a
//! section, and the registry that executes them.
//!
//! # Module Structure
//!
//! - [`wikipedia`](crate::tools::wikipedia) - Encyclopedia lookup via the MediaWiki API
//! - [`web`](crate::tools::web) - General web search (DuckDuckGo via daedra, or Tavily)
//! - [`arxiv`](crate::tools::arxiv) - Academic papers via the arXiv Atom API
//! - [`registry`](crate::tools::registry) - Tool definitions and timed invocation
//!
//! ```ignore
//! let registry = SearchToolRegistry::from_config(&config.search)?;
//! let results = registry.invoke(SearchEngine::Wiki, "transformer architecture").await?;
//! ```

/// arXiv search.
pub mod arxiv;
/// Search tool trait and registry.
pub mod registry;
/// Web search.
pub mod web;
/// Wikipedia search.
pub mod wikipedia;

pub use registry::{SearchTool, SearchToolRegistry};

/// Collapse runs of newlines and tabs into a single space
pub fn normalize_content(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        if c == '\n' || c == '\t' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_breaks() {
        assert_eq!(normalize_content("a\n\n\tb\nc"), "a b c");
        assert_eq!(normalize_content("no breaks"), "no breaks");
        assert_eq!(normalize_content("keep  spaces\r\n"), "keep  spaces\r ");
    }
}
