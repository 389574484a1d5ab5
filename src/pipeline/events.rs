//! Progress events published by a pipeline run.

use crate::agent::AgentRole;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Download,
    Transcription,
    Understanding,
    Editing,
    Report,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Search => "Search",
            Stage::Download => "Download",
            Stage::Transcription => "Transcription",
            Stage::Understanding => "Understanding",
            Stage::Editing => "Editing",
            Stage::Report => "Report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<AgentRole> for Stage {
    fn from(role: AgentRole) -> Self {
        match role {
            AgentRole::Search => Stage::Search,
            AgentRole::Download => Stage::Download,
            AgentRole::Understanding => Stage::Understanding,
            AgentRole::Editing => Stage::Editing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    Progress,
    ToolCall,
    Completed,
    Skipped,
    Failed,
}

impl EventKind {
    /// Whether this event closes its stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Completed | EventKind::Skipped | EventKind::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    pub run_id: Uuid,
    pub stage: Stage,
    pub kind: EventKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Write-only handle for publishing [`RunEvent`]s.
///
/// Cloning shares the run id and channel. Publishing never fails: once the
/// consumer is gone, events are dropped.
#[derive(Debug, Clone)]
pub struct RunTrace {
    run_id: Uuid,
    tx: Option<UnboundedSender<RunEvent>>,
}

impl RunTrace {
    /// A trace for a new run and the receiver that consumes it.
    pub fn channel() -> (Self, UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                run_id: Uuid::new_v4(),
                tx: Some(tx),
            },
            rx,
        )
    }

    /// A trace that publishes nowhere.
    pub fn disabled() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tx: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn emit(&self, stage: Stage, kind: EventKind, message: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(RunEvent {
                run_id: self.run_id,
                stage,
                kind,
                message: message.into(),
                at: Utc::now(),
            });
        }
    }

    pub fn begin(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, EventKind::Started, message);
    }

    pub fn progress(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, EventKind::Progress, message);
    }

    pub fn tool_call(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, EventKind::ToolCall, message);
    }

    pub fn complete(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, EventKind::Completed, message);
    }

    pub fn skip(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, EventKind::Skipped, message);
    }

    pub fn fail(&self, stage: Stage, message: impl Into<String>) {
        self.emit(stage, EventKind::Failed, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (trace, mut rx) = RunTrace::channel();
        trace.begin(Stage::Search, "looking");
        trace.clone().tool_call(Stage::Search, "search_youtube_videos");
        trace.complete(Stage::Search, "found");
        drop(trace);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.stage, Stage::Search);
            kinds.push(event.kind);
        }
        assert_eq!(kinds, vec![EventKind::Started, EventKind::ToolCall, EventKind::Completed]);
    }

    #[test]
    fn test_publishing_after_consumer_dropped() {
        let (trace, rx) = RunTrace::channel();
        drop(rx);
        trace.fail(Stage::Download, "no consumer");
        RunTrace::disabled().begin(Stage::Editing, "nowhere");
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(EventKind::Completed.is_terminal());
        assert!(EventKind::Failed.is_terminal());
        assert!(!EventKind::ToolCall.is_terminal());
    }
}
