use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============= Plan Types =============

/// One section of the report plan.
///
/// Produced once by plan schema extraction and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SectionPlan {
    /// Title of the section
    pub title: String,
    /// Overview covering the main topics and points of the section
    pub overview: String,
    /// Whether writing this section requires searching the internet
    pub web_search_required: bool,
}

impl SectionPlan {
    pub fn new(title: impl Into<String>, overview: impl Into<String>, web_search_required: bool) -> Self {
        Self {
            title: title.into(),
            overview: overview.into(),
            web_search_required,
        }
    }
}

/// Structured plan as returned by the schema extraction model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlannedSections {
    /// Sections of the report, in reading order
    pub sections: Vec<SectionPlan>,
}

/// Sub-topics worth searching to understand a section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TopicList {
    /// At most three search topics relevant to the section
    pub topics: Vec<String>,
}

/// A finished section of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WrittenSection {
    /// Title of the section
    pub title: String,
    /// Written content of the section
    pub content: String,
    /// Sources used while writing, as free text
    pub sources: String,
}

// ============= Search Types =============

/// Backend family a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SearchEngine {
    /// Encyclopedia lookup (Wikipedia)
    Wiki,
    /// General web search
    Web,
    /// Academic paper search (arXiv)
    Academic,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 3] = [SearchEngine::Wiki, SearchEngine::Web, SearchEngine::Academic];

    /// Name of the tool the language model uses to request this engine
    pub fn tool_name(self) -> &'static str {
        match self {
            SearchEngine::Wiki => "search_wikipedia",
            SearchEngine::Web => "search_web",
            SearchEngine::Academic => "search_arxiv",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|engine| engine.tool_name() == name)
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchEngine::Wiki => "Wikipedia",
            SearchEngine::Web => "Web",
            SearchEngine::Academic => "arXiv",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub search_query: String,
    pub title: String,
    pub source: String,
    pub content: String,
    pub search_engine: SearchEngine,
}

impl SearchResult {
    /// The (tool, query) pair that produced this result
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.search_engine, self.search_query.clone())
    }
}

/// Identity of one search execution, used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    pub engine: SearchEngine,
    pub query: String,
}

impl QueryKey {
    pub fn new(engine: SearchEngine, query: impl Into<String>) -> Self {
        Self {
            engine,
            query: query.into(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.engine.tool_name(), self.query)
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Plan schema error: {0}")]
    PlanSchema(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("Synthesis failed during {step}: {message}")]
    Synthesis { step: String, message: String },

    #[error("Dedup violation: {tool}({query}) executed twice in one scope")]
    DedupViolation { tool: String, query: String },

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn synthesis(step: impl Into<String>, message: impl fmt::Display) -> Self {
        AppError::Synthesis {
            step: step.into(),
            message: message.to_string(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl fmt::Display) -> Self {
        AppError::ToolInvocation {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::ToolInvocation { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
