use crate::llm::client::{LLMClient, LLMResponse, ModelParams};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: ModelParams,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, params: ModelParams) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            params,
        }
    }

    fn build_request(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<CreateChatCompletionRequest> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                system.to_string(),
            )),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                prompt.to_string(),
            )),
        ]);

        if let Some(temperature) = self.params.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = self.params.max_tokens {
            args.max_completion_tokens(max_tokens);
        }

        if !tools.is_empty() {
            let openai_tools: Vec<ChatCompletionTool> = tools
                .iter()
                .map(|tool| ChatCompletionTool {
                    r#type: ChatCompletionToolType::Function,
                    function: async_openai::types::FunctionObject {
                        name: tool.name.clone(),
                        description: Some(tool.description.clone()),
                        parameters: Some(tool.parameters.clone()),
                        strict: None,
                    },
                })
                .collect();
            args.tools(openai_tools)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        args.build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let request = self.build_request(system, prompt, &[])?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }

    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let request = self.build_request(system, prompt, tools)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let finish_reason = choice
            .finish_reason
            .as_ref()
            .map(|r| format!("{:?}", r))
            .unwrap_or_else(|| "unknown".to_string());

        let tool_calls = if let Some(calls) = &choice.message.tool_calls {
            calls
                .iter()
                .map(|call| ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: serde_json::from_str(&call.function.arguments)
                        .unwrap_or(serde_json::json!({})),
                })
                .collect()
        } else {
            vec![]
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn params(&self) -> &ModelParams {
        &self.params
    }
}
