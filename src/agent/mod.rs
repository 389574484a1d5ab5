//! Agent capability boundary.
//!
//! The pipeline only sees the [`Agent`] trait: a role, a task, optional
//! context and a declared [`OutputSchema`] go in, and either a
//! [`StageOutput`] of that shape or an error comes out. [`OpenAiAgent`]
//! implements it with a chat completion tool calling loop over the media and
//! transcript tools in [`tools`].

mod runner;
mod schema;
mod tools;

pub use runner::OpenAiAgent;
pub use schema::{
    AgentRole, DownloadResult, EditingResult, KeyStep, OutputSchema, SearchResult, StageOutput,
    UnderstandingResult,
};
pub use tools::{
    error_result, parse_tool_call, role_tools, tool_definitions, OverlayArg, ToolCall, ToolContext,
};

use crate::error::Result;
use async_trait::async_trait;

/// One invocation of an agent role.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub role: AgentRole,
    pub task: String,
    pub context: Option<String>,
    pub schema: OutputSchema,
    /// Model round trips allowed before giving up with `TurnBudgetExceeded`.
    pub max_turns: usize,
}

impl AgentRequest {
    /// A request for `role` expecting that role's usual output shape.
    pub fn new(role: AgentRole, task: impl Into<String>, max_turns: usize) -> Self {
        Self {
            role,
            task: task.into(),
            context: None,
            schema: OutputSchema::for_role(role),
            max_turns,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A capability that completes a task in a given role.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run the task to completion, returning output of `request.schema`.
    async fn invoke(&self, request: AgentRequest) -> Result<StageOutput>;
}
