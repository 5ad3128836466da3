//! Mock implementations for testing.
//!
//! A scripted LLM client that answers according to which workflow step is
//! calling it, and counting search tools, shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use deep_researcher::llm::{LLMClient, LLMResponse, ModelParams, StepClients};
use deep_researcher::research::prompts;
use deep_researcher::tools::{SearchTool, SearchToolRegistry};
use deep_researcher::types::{
    AppError, QueryKey, Result, SearchEngine, SearchResult, SectionPlan, ToolCall, ToolDefinition,
};
use deep_researcher::ReportCoordinator;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Workflow step a model call belongs to, recognised by its system prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Planner,
    PlanSchema,
    SearchQuery,
    Topics,
    SectionWriter,
    PlainWriter,
}

impl Step {
    fn of(system: &str) -> Self {
        if system.starts_with(prompts::PLANNER_SYSTEM) {
            Step::Planner
        } else if system.starts_with(prompts::PLAN_SCHEMA_SYSTEM) {
            Step::PlanSchema
        } else if system.starts_with(prompts::SEARCH_QUERY_SYSTEM) {
            Step::SearchQuery
        } else if system.starts_with(prompts::TOPICS_SYSTEM) {
            Step::Topics
        } else if system.starts_with(prompts::SECTION_WRITER_SYSTEM) {
            Step::SectionWriter
        } else if system.starts_with(prompts::PLAIN_WRITER_SYSTEM) {
            Step::PlainWriter
        } else {
            panic!("unexpected system prompt: {}", system)
        }
    }
}

/// How the mock misbehaves for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Transport error
    Error,
    /// Reply that is not JSON
    Garbage,
}

type ToolCallScript = Box<dyn Fn(&str, &str) -> Vec<ToolCall> + Send + Sync>;

/// Scripted LLM client.
///
/// - the plan step returns fixed sections
/// - the topic step returns `topics_per_section` topics (or a per-section override)
/// - the search step calls `search_web(topic)` and `search_wikipedia(section)`
///   unless a custom tool call script is set
/// - writers echo what they were given so tests can inspect it
pub struct MockLLMClient {
    sections: Vec<SectionPlan>,
    topics_per_section: usize,
    topic_overrides: HashMap<String, Vec<String>>,
    tool_calls: Option<ToolCallScript>,
    faults: HashMap<Step, Fault>,
    params: ModelParams,
    calls: Mutex<Vec<(Step, String)>>,
}

impl MockLLMClient {
    pub fn new(sections: Vec<SectionPlan>) -> Self {
        Self {
            sections,
            topics_per_section: 2,
            topic_overrides: HashMap::new(),
            tool_calls: None,
            faults: HashMap::new(),
            params: ModelParams {
                temperature: Some(0.0),
                max_tokens: Some(2048),
                max_retries: 0,
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_topics_per_section(mut self, count: usize) -> Self {
        self.topics_per_section = count;
        self
    }

    pub fn with_topics(mut self, section: &str, topics: &[&str]) -> Self {
        self.topic_overrides.insert(
            section.to_string(),
            topics.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_tool_calls(
        mut self,
        script: impl Fn(&str, &str) -> Vec<ToolCall> + Send + Sync + 'static,
    ) -> Self {
        self.tool_calls = Some(Box::new(script));
        self
    }

    pub fn with_fault(mut self, step: Step, fault: Fault) -> Self {
        self.faults.insert(step, fault);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.params.max_retries = max_retries;
        self
    }

    /// Prompts received for `step`, in call order
    pub fn prompts(&self, step: Step) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(s, _)| *s == step)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn call_count(&self, step: Step) -> usize {
        self.prompts(step).len()
    }

    fn record(&self, step: Step, prompt: &str) -> Result<()> {
        self.calls.lock().push((step, prompt.to_string()));
        match self.faults.get(&step) {
            Some(Fault::Error) => Err(AppError::LLM(format!("mock failure in {:?}", step))),
            _ => Ok(()),
        }
    }

    fn reply(&self, step: Step, prompt: &str) -> String {
        if self.faults.get(&step) == Some(&Fault::Garbage) {
            return "I'd rather not answer in JSON.".to_string();
        }

        match step {
            Step::Planner => {
                let mut plan = String::from("Report plan\n");
                for section in &self.sections {
                    plan.push_str(&format!("## {}\n{}\n", section.title, section.overview));
                }
                plan
            }
            Step::PlanSchema => json!({ "sections": self.sections }).to_string(),
            Step::Topics => {
                let title = field(prompt, "Section: ");
                let topics = self.topic_overrides.get(&title).cloned().unwrap_or_else(|| {
                    (1..=self.topics_per_section)
                        .map(|i| format!("{} topic {}", title, i))
                        .collect()
                });
                json!({ "topics": topics }).to_string()
            }
            Step::SectionWriter => {
                let title = field(prompt, "Section: ");
                let results = prompt.matches("\nQuery: ").count();
                json!({
                    "title": format!("Model title for {}", title),
                    "content": format!("{} written from {} search results", title, results),
                    "sources": "mock sources",
                })
                .to_string()
            }
            Step::PlainWriter => {
                let title = field(prompt, "Section: ");
                let seen: Vec<String> = prompt
                    .lines()
                    .skip(1)
                    .filter_map(|line| line.strip_prefix("Section: "))
                    .map(str::to_string)
                    .collect();
                json!({
                    "title": title,
                    "content": format!("{} builds on [{}]", title, seen.join(", ")),
                    "sources": "",
                })
                .to_string()
            }
            Step::SearchQuery => String::new(),
        }
    }
}

/// Value of the first line starting with `prefix`
fn field(prompt: &str, prefix: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub fn tool_call(name: &str, query: &str) -> ToolCall {
    ToolCall {
        id: format!("{}:{}", name, query),
        name: name.to_string(),
        arguments: json!({ "query": query }),
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let step = Step::of(system);
        self.record(step, prompt)?;
        Ok(self.reply(step, prompt))
    }

    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let step = Step::of(system);
        self.record(step, prompt)?;

        let (topic, section) = prompt.rsplit_once(" in ").unwrap_or((prompt, ""));
        let calls = match &self.tool_calls {
            Some(script) => script(topic, section),
            None => vec![
                tool_call("search_web", topic),
                tool_call("search_wikipedia", section),
            ],
        };
        let offered: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        let calls: Vec<ToolCall> = calls
            .into_iter()
            .filter(|c| offered.contains(&c.name.as_str()))
            .collect();

        Ok(LLMResponse {
            content: String::new(),
            finish_reason: if calls.is_empty() { "stop" } else { "tool_calls" }.to_string(),
            tool_calls: calls,
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn params(&self) -> &ModelParams {
        &self.params
    }
}

/// Search tool that records every query and returns one result per query
pub struct MockSearchTool {
    engine: SearchEngine,
    delay: Duration,
    fail: bool,
    fail_first: usize,
    queries: Mutex<Vec<String>>,
}

impl MockSearchTool {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            delay: Duration::ZERO,
            fail: false,
            fail_first: 0,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(engine: SearchEngine) -> Self {
        Self {
            fail: true,
            ..Self::new(engine)
        }
    }

    /// Fail the first `calls` searches, then succeed
    pub fn failing_first(mut self, calls: usize) -> Self {
        self.fail_first = calls;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn executions(&self) -> Vec<QueryKey> {
        self.queries()
            .into_iter()
            .map(|q| QueryKey::new(self.engine, q))
            .collect()
    }
}

#[async_trait]
impl SearchTool for MockSearchTool {
    fn engine(&self) -> SearchEngine {
        self.engine
    }

    fn description(&self) -> &str {
        "Mock search backend"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let call = {
            let mut queries = self.queries.lock();
            queries.push(query.to_string());
            queries.len()
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail || call <= self.fail_first {
            return Err(AppError::tool(self.engine.tool_name(), "backend unavailable"));
        }
        Ok(vec![SearchResult {
            search_query: query.to_string(),
            title: format!("{} result for {}", self.engine, query),
            source: format!("https://example.org/{}/{}", self.engine, query.replace(' ', "_")),
            content: format!("Facts about {}", query),
            search_engine: self.engine,
        }])
    }
}

/// The three backends as mocks
pub struct MockBackends {
    pub wiki: Arc<MockSearchTool>,
    pub web: Arc<MockSearchTool>,
    pub arxiv: Arc<MockSearchTool>,
}

impl MockBackends {
    pub fn new() -> Self {
        Self::from_tools(
            MockSearchTool::new(SearchEngine::Wiki),
            MockSearchTool::new(SearchEngine::Web),
            MockSearchTool::new(SearchEngine::Academic),
        )
    }

    pub fn from_tools(wiki: MockSearchTool, web: MockSearchTool, arxiv: MockSearchTool) -> Self {
        Self {
            wiki: Arc::new(wiki),
            web: Arc::new(web),
            arxiv: Arc::new(arxiv),
        }
    }

    pub fn registry(&self) -> Arc<SearchToolRegistry> {
        let mut registry = SearchToolRegistry::new();
        registry.register(self.wiki.clone());
        registry.register(self.web.clone());
        registry.register(self.arxiv.clone());
        Arc::new(registry)
    }

    /// Every (engine, query) execution across all backends
    pub fn executions(&self) -> Vec<QueryKey> {
        let mut all = self.wiki.executions();
        all.extend(self.web.executions());
        all.extend(self.arxiv.executions());
        all
    }
}

pub fn coordinator(llm: Arc<MockLLMClient>, backends: &MockBackends) -> ReportCoordinator {
    ReportCoordinator::new(StepClients::uniform(llm), backends.registry(), 3)
}
