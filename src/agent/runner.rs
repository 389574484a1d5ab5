//! OpenAI-backed agent with a tool calling loop.

use super::schema::{AgentRole, StageOutput};
use super::tools::{error_result, parse_tool_call, role_tools, tool_definitions, ToolContext};
use super::{Agent, AgentRequest};
use crate::config::{AgentSettings, Prompts, Settings};
use crate::error::{Result, StepreelError};
use crate::openai::create_client;
use crate::pipeline::{RunTrace, Stage};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Agent that runs each role as a chat completion loop with role-specific tools.
pub struct OpenAiAgent {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    models: AgentSettings,
    prompts: Prompts,
    tools: ToolContext,
    variables: HashMap<String, String>,
    trace: RunTrace,
}

impl OpenAiAgent {
    pub fn new(models: AgentSettings, prompts: Prompts, tools: ToolContext) -> Self {
        Self {
            client: create_client(),
            models,
            prompts,
            tools,
            variables: HashMap::new(),
            trace: RunTrace::disabled(),
        }
    }

    pub fn from_settings(settings: &Settings, prompts: Prompts) -> Self {
        let mut agent = Self::new(
            settings.agents.clone(),
            prompts,
            ToolContext::from_settings(settings),
        );
        agent.variables.insert(
            "videos_dir".to_string(),
            settings.videos_dir().display().to_string(),
        );
        agent
    }

    /// Set a template variable available to every role's instructions.
    pub fn with_variable(mut self, key: &str, value: impl Into<String>) -> Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }

    /// Report tool calls on `trace`.
    pub fn with_trace(mut self, trace: RunTrace) -> Self {
        self.trace = trace;
        self
    }

    fn model_for(&self, role: AgentRole) -> &str {
        match role {
            AgentRole::Search => &self.models.search_model,
            AgentRole::Download => &self.models.download_model,
            AgentRole::Understanding => &self.models.understanding_model,
            AgentRole::Editing => &self.models.editing_model,
        }
    }

    fn system_prompt(&self, role: AgentRole) -> String {
        let template = match role {
            AgentRole::Search => &self.prompts.search.system,
            AgentRole::Download => &self.prompts.download.system,
            AgentRole::Understanding => &self.prompts.understanding.system,
            AgentRole::Editing => &self.prompts.editing.system,
        };
        self.prompts.render_with_custom(template, &self.variables)
    }

    /// Execute a single tool call and return what the model should see.
    async fn execute_tool_call(
        &self,
        role: AgentRole,
        tool_call: &ChatCompletionMessageToolCall,
    ) -> String {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;
        let stage = Stage::from(role);

        info!("Agent {} calling tool: {} with args: {}", role, name, arguments);
        self.trace.tool_call(stage, format!("{}({})", name, arguments));

        if !role_tools(role).contains(&name.as_str()) {
            warn!("Agent {} requested unavailable tool {}", role, name);
            return error_result(&StepreelError::Agent(format!(
                "Tool {} is not available to the {} agent",
                name, role
            )));
        }

        let result = match parse_tool_call(name, arguments) {
            Ok(tool) => self.tools.execute(&tool).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => {
                self.trace.progress(stage, format!("{} succeeded", name));
                output
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                self.trace.progress(stage, format!("{} failed: {}", name, e));
                error_result(&e)
            }
        }
    }
}

fn user_message(task: &str, context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!("Context: {}\n\nTask: {}", ctx, task),
        None => task.to_string(),
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    #[instrument(skip(self, request), fields(role = %request.role, max_turns = request.max_turns))]
    async fn invoke(&self, request: AgentRequest) -> Result<StageOutput> {
        let role = request.role;

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt(role))
                .build()
                .map_err(|e| StepreelError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message(&request.task, request.context.as_deref()))
                .build()
                .map_err(|e| StepreelError::Agent(e.to_string()))?
                .into(),
        ];

        let tools = tool_definitions(role);
        let mut turns = 0;

        loop {
            turns += 1;
            if turns > request.max_turns {
                return Err(StepreelError::TurnBudgetExceeded(request.max_turns));
            }

            debug!("Agent {} turn {}", role, turns);

            let mut builder = CreateChatCompletionRequestArgs::default();
            builder
                .model(self.model_for(role))
                .messages(messages.clone())
                .tools(tools.clone());
            if request.schema.is_structured() {
                builder.response_format(ResponseFormat::JsonObject);
            }
            let completion = builder
                .build()
                .map_err(|e| StepreelError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(completion)
                .await
                .map_err(|e| StepreelError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| StepreelError::Agent("No response from model".to_string()))?;

            match &choice.message.tool_calls {
                Some(tool_calls) if !tool_calls.is_empty() => {
                    let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                        .tool_calls(tool_calls.clone())
                        .build()
                        .map_err(|e| StepreelError::Agent(e.to_string()))?;
                    messages.push(assistant_msg.into());

                    for tool_call in tool_calls {
                        let result = self.execute_tool_call(role, tool_call).await;
                        let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(&tool_call.id)
                            .content(result)
                            .build()
                            .map_err(|e| StepreelError::Agent(e.to_string()))?;
                        messages.push(tool_msg.into());
                    }
                }
                _ => {
                    let content = choice.message.content.clone().unwrap_or_default();
                    debug!("Agent {} finished after {} turns", role, turns);
                    return request.schema.parse(&content);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_with_context() {
        assert_eq!(
            user_message("Download it", Some("url: https://x.test/v")),
            "Context: url: https://x.test/v\n\nTask: Download it"
        );
        assert_eq!(user_message("Download it", None), "Download it");
    }

    #[test]
    fn test_system_prompt_is_rendered() {
        let agent = OpenAiAgent::from_settings(&Settings::default(), Prompts::default())
            .with_variable("max_duration", "300");

        let search = agent.system_prompt(AgentRole::Search);
        assert!(search.contains("no longer than 300 seconds"));
        assert!(!search.contains("{{"));

        let download = agent.system_prompt(AgentRole::Download);
        assert!(download.contains("videos"));
        assert!(!download.contains("{{videos_dir}}"));
    }

    #[test]
    fn test_models_per_role() {
        let agent = OpenAiAgent::from_settings(&Settings::default(), Prompts::default());
        assert_eq!(agent.model_for(AgentRole::Search), "gpt-4o");
        assert_eq!(agent.model_for(AgentRole::Editing), "o3-mini");
    }
}
