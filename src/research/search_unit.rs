//! Leaf graph: pick search tool calls for one topic and execute the new ones

use crate::llm::LLMClient;
use crate::llm::structured::with_retries;
use crate::research::prompts;
use crate::tools::SearchToolRegistry;
use crate::types::{AppError, QueryKey, Result, SearchEngine, ToolCall};
use crate::workflows::state::{SearchUnitInput, SearchUnitOutput};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SearchUnit {
    llm: Arc<dyn LLMClient>,
    tools: Arc<SearchToolRegistry>,
}

impl SearchUnit {
    pub fn new(llm: Arc<dyn LLMClient>, tools: Arc<SearchToolRegistry>) -> Self {
        Self { llm, tools }
    }

    pub async fn run(&self, input: SearchUnitInput) -> Result<SearchUnitOutput> {
        let calls = self.create_search_query(&input).await?;
        let already_used: HashSet<QueryKey> = input.queries_already_used.iter().cloned().collect();
        let planned = plan_invocations(&calls, &already_used);

        tracing::debug!(
            topic = %input.topic,
            requested = calls.len(),
            planned = planned.len(),
            "Search tool calls selected"
        );

        self.call_search_tools(planned, &already_used).await
    }

    /// Ask the model which search tools to call
    async fn create_search_query(&self, input: &SearchUnitInput) -> Result<Vec<ToolCall>> {
        let definitions = self.tools.definitions();
        let prompt = prompts::search_query_prompt(&input.topic, &input.section_title);
        let llm = self.llm.as_ref();
        let definitions = definitions.as_slice();
        let prompt = prompt.as_str();

        let response = with_retries("create_search_query", llm.params().max_retries, || async move {
            llm.generate_with_tools(prompts::SEARCH_QUERY_SYSTEM, prompt, definitions)
                .await
                .map_err(|e| e.to_string())
        })
        .await?;

        Ok(response.tool_calls)
    }

    /// Execute planned queries concurrently.
    ///
    /// A failing backend contributes nothing, not even its query.
    async fn call_search_tools(
        &self,
        planned: Vec<QueryKey>,
        already_used: &HashSet<QueryKey>,
    ) -> Result<SearchUnitOutput> {
        let mut executed = HashSet::new();
        for key in &planned {
            if already_used.contains(key) || !executed.insert(key.clone()) {
                return Err(AppError::DedupViolation {
                    tool: key.engine.tool_name().to_string(),
                    query: key.query.clone(),
                });
            }
        }

        let outcomes = join_all(
            planned
                .iter()
                .map(|key| self.tools.invoke(key.engine, &key.query)),
        )
        .await;

        let mut output = SearchUnitOutput::default();
        for (key, outcome) in planned.into_iter().zip(outcomes) {
            match outcome {
                Ok(results) => {
                    tracing::debug!(query = %key, results = results.len(), "Search finished");
                    output.search_results.extend(results);
                    output.queries_used.push(key);
                }
                // Left out of queries_used so a sibling's successful run of the same query is kept
                Err(e) => tracing::warn!(query = %key, error = %e, "Search failed, treating as no results"),
            }
        }

        Ok(output)
    }
}

/// Turn model tool calls into the queries to execute.
///
/// Calls to unknown tools or without a query are ignored. A (tool, query)
/// pair already used in this scope, or repeated within `calls`, is skipped.
pub fn plan_invocations(calls: &[ToolCall], already_used: &HashSet<QueryKey>) -> Vec<QueryKey> {
    let mut planned: Vec<QueryKey> = Vec::new();

    for call in calls {
        let Some(engine) = SearchEngine::from_tool_name(&call.name) else {
            tracing::warn!(tool = %call.name, "Model requested an unknown tool");
            continue;
        };
        let Some(query) = query_argument(&call.arguments) else {
            tracing::warn!(tool = %call.name, "Tool call has no query argument");
            continue;
        };

        let key = QueryKey::new(engine, query);
        if already_used.contains(&key) {
            tracing::debug!(query = %key, "Query already used, skipping");
            continue;
        }
        if planned.contains(&key) {
            tracing::debug!(query = %key, "Query repeated in one reply, skipping");
            continue;
        }
        planned.push(key);
    }

    planned
}

fn query_argument(arguments: &serde_json::Value) -> Option<String> {
    let query = match arguments {
        serde_json::Value::String(s) => s.as_str(),
        other => other.get("query")?.as_str()?,
    };
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_string())
}
