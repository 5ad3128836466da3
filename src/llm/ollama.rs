use crate::llm::client::{LLMClient, LLMResponse, ModelParams};
use crate::llm::structured::parse_structured;
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
    models::ModelOptions,
};
use serde::Deserialize;

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    params: ModelParams,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String, params: ModelParams) -> Self {
        let (host, port) = split_base_url(base_url);
        let client = Ollama::new(host, port);

        Self {
            client,
            model,
            params,
        }
    }

    fn options(&self) -> ModelOptions {
        let mut options = ModelOptions::default();
        if let Some(temperature) = self.params.temperature {
            options = options.temperature(temperature);
        }
        if let Some(max_tokens) = self.params.max_tokens {
            options = options.num_predict(max_tokens as i32);
        }
        options
    }

    async fn chat(&self, system: &str, prompt: &str) -> Result<String> {
        let messages = vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ];

        let request = ChatMessageRequest::new(self.model.clone(), messages).options(self.options());

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Split `scheme://host:port` into the host URL and port ollama-rs expects
fn split_base_url(base_url: &str) -> (String, u16) {
    match reqwest::Url::parse(base_url) {
        Ok(url) => (
            format!("{}://{}", url.scheme(), url.host_str().unwrap_or("localhost")),
            url.port().unwrap_or(DEFAULT_OLLAMA_PORT),
        ),
        Err(_) => ("http://localhost".to_string(), DEFAULT_OLLAMA_PORT),
    }
}

#[derive(Deserialize)]
struct ToolProtocolReply {
    #[serde(default)]
    tool_calls: Vec<ToolProtocolCall>,
}

#[derive(Deserialize)]
struct ToolProtocolCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Tool selection instructions for models served without native tool calling
fn tool_protocol_prompt(tools: &[ToolDefinition]) -> String {
    let listing = tools
        .iter()
        .map(|tool| {
            format!(
                "- {}: {}\n  arguments schema: {}",
                tool.name, tool.description, tool.parameters
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You can call the following tools:\n{}\n\n\
         Reply only with JSON of the form \
         {{\"tool_calls\": [{{\"name\": \"<tool>\", \"arguments\": {{...}}}}]}}. \
         Use an empty list when no tool is needed.",
        listing
    )
}

fn parse_tool_protocol(reply: &str) -> Vec<ToolCall> {
    match parse_structured::<ToolProtocolReply>(reply) {
        Ok(parsed) => parsed
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, call)| ToolCall {
                id: format!("call_{}", i),
                name: call.name,
                arguments: call.arguments,
            })
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Ollama reply carried no tool calls");
            vec![]
        }
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(system, prompt).await
    }

    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        if tools.is_empty() {
            let content = self.chat(system, prompt).await?;
            return Ok(LLMResponse {
                content,
                tool_calls: vec![],
                finish_reason: "stop".to_string(),
            });
        }

        let system = format!("{}\n\n{}", system, tool_protocol_prompt(tools));
        let content = self.chat(&system, prompt).await?;
        let tool_calls = parse_tool_protocol(&content);
        let finish_reason = if tool_calls.is_empty() {
            "stop"
        } else {
            "tool_calls"
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason: finish_reason.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn params(&self) -> &ModelParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_parsing_full() {
        let (host, port) = split_base_url("http://localhost:11434");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn test_url_parsing_no_port() {
        let (host, port) = split_base_url("http://localhost");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn test_url_parsing_custom_port() {
        let (host, port) = split_base_url("http://192.168.1.100:8080");
        assert_eq!(host, "http://192.168.1.100");
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_url_parsing_garbage_falls_back() {
        let (host, port) = split_base_url("not a url");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11434);
    }

    #[test]
    fn test_tool_protocol_prompt_lists_tools() {
        let tools = vec![ToolDefinition {
            name: "search_wikipedia".to_string(),
            description: "Encyclopedia lookup".to_string(),
            parameters: json!({"type": "object"}),
        }];
        let prompt = tool_protocol_prompt(&tools);
        assert!(prompt.contains("search_wikipedia"));
        assert!(prompt.contains("tool_calls"));
    }

    #[test]
    fn test_parse_tool_protocol() {
        let reply = r#"```json
{"tool_calls": [{"name": "search_arxiv", "arguments": {"query": "diffusion models"}}]}
```"#;
        let calls = parse_tool_protocol(reply);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search_arxiv");
        assert_eq!(calls[0].arguments["query"], "diffusion models");
        assert_eq!(calls[0].id, "call_0");
    }

    #[test]
    fn test_parse_tool_protocol_tolerates_prose() {
        assert!(parse_tool_protocol("I don't think a search is needed.").is_empty());
    }
}
