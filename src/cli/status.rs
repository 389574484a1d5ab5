//! Live display of pipeline progress.

use super::output::one_line;
use super::Output;
use crate::pipeline::{EventKind, RunEvent, Stage};
use console::style;
use indicatif::ProgressBar;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const MESSAGE_WIDTH: usize = 80;

/// Renders [`RunEvent`]s as spinners, or as plain lines with `--no-pretty`.
///
/// Purely presentational: the pipeline never waits on it.
pub struct StatusReporter {
    pretty: bool,
    spinners: HashMap<Stage, ProgressBar>,
}

impl StatusReporter {
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            spinners: HashMap::new(),
        }
    }

    /// Consume events until every sender is dropped.
    pub fn spawn(mut self, mut events: UnboundedReceiver<RunEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.handle(&event);
            }
            self.finish();
        })
    }

    fn handle(&mut self, event: &RunEvent) {
        if !self.pretty {
            eprintln!("{}", plain_line(event));
            return;
        }

        let message = one_line(&event.message, MESSAGE_WIDTH);
        match event.kind {
            EventKind::Started => {
                let spinner = Output::stage_spinner(event.stage.label(), &message);
                if let Some(previous) = self.spinners.insert(event.stage, spinner) {
                    previous.finish_and_clear();
                }
            }
            EventKind::Progress | EventKind::ToolCall => match self.spinners.get(&event.stage) {
                Some(spinner) => spinner.set_message(message),
                None => {
                    let spinner = Output::stage_spinner(event.stage.label(), &message);
                    self.spinners.insert(event.stage, spinner);
                }
            },
            EventKind::Completed | EventKind::Skipped | EventKind::Failed => {
                let icon = match event.kind {
                    EventKind::Completed => style("✓").green(),
                    EventKind::Skipped => style("-").dim(),
                    _ => style("✗").red(),
                };
                let line = format!("{} {} {}", icon, style(event.stage.label()).bold(), message);
                if let Some(spinner) = self.spinners.remove(&event.stage) {
                    spinner.finish_and_clear();
                }
                eprintln!("{}", line);
            }
        }
    }

    fn finish(&mut self) {
        for (_, spinner) in self.spinners.drain() {
            spinner.finish_and_clear();
        }
    }
}

/// `[HH:MM:SS] Stage kind: message`
fn plain_line(event: &RunEvent) -> String {
    let kind = match event.kind {
        EventKind::Started => "started",
        EventKind::Progress => "progress",
        EventKind::ToolCall => "tool",
        EventKind::Completed => "completed",
        EventKind::Skipped => "skipped",
        EventKind::Failed => "failed",
    };
    format!(
        "[{}] {} {}: {}",
        event.at.format("%H:%M:%S"),
        event.stage,
        kind,
        one_line(&event.message, MESSAGE_WIDTH)
    )
}
