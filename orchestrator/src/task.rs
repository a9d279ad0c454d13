//! Tasks and their outputs

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::agent::Agent;
use crate::error::CrewError;
use crate::template::{self, TemplateVars};

/// Output of one completed task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutput {
    /// Position of the task in its crew
    pub task_index: usize,
    /// Role of the agent that produced it
    pub role: String,
    /// Description the task ran with
    pub description: String,
    /// Raw completion text, unmodified
    pub raw: String,
    /// Model that produced it
    pub model: String,
    /// Duration of the completion call
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// One step of work bound to an agent
#[derive(Debug, Clone)]
pub struct Task {
    description: String,
    expected_output: String,
    agent: Arc<Agent>,
    /// Inputs the persona and description are rendered with
    vars: TemplateVars,
    /// Pre-expanded literal text appended to the description (e.g. search results)
    extra_context: Vec<String>,
    /// Position in the owning crew, set when the crew is built
    position: Option<usize>,
    result: Option<TaskOutput>,
}

impl Task {
    /// Create a new task
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: Arc<Agent>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
            vars: TemplateVars::new(),
            extra_context: Vec::new(),
            position: None,
            result: None,
        }
    }

    /// Render the description for a run's inputs
    ///
    /// Called by [`crate::Crew::new`]; unknown placeholders are left as-is.
    pub fn bind(&mut self, vars: &TemplateVars) {
        self.description = template::render(&self.description, vars);
        self.vars = vars.clone();
    }

    /// Append literal text to the description before prompt composition
    pub fn with_context(mut self, extra: impl Into<String>) -> Self {
        self.push_context(extra);
        self
    }

    /// In-place form of [`Task::with_context`]
    pub fn push_context(&mut self, extra: impl Into<String>) {
        self.extra_context.push(extra.into());
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = Some(position);
    }

    /// Position in the owning crew, if the task belongs to one
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn result(&self) -> Option<&TaskOutput> {
        self.result.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Description plus any appended context, as the model will see it
    pub fn effective_description(&self) -> String {
        let mut description = self.description.clone();
        for extra in &self.extra_context {
            description.push_str("\n\n");
            description.push_str(extra.trim_end());
        }
        description
    }

    /// Compose the full prompt for this task
    ///
    /// Order is fixed: persona, description, expected output, then every
    /// preceding output verbatim in the order it was produced.
    pub fn build_prompt(&self, preceding: &[TaskOutput]) -> String {
        let mut prompt = self.agent.compose_persona_prompt_with(&self.vars);

        prompt.push_str("\n\nCurrent task: ");
        prompt.push_str(&self.effective_description());

        let expected = self.expected_output.trim();
        if !expected.is_empty() {
            prompt.push_str("\n\nRespond in the following form: ");
            prompt.push_str(expected);
        }

        if !preceding.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with, from the tasks completed before this one:");
            for output in preceding {
                let _ = write!(
                    prompt,
                    "\n\n### Prior context: task {} ({})\n{}",
                    output.task_index + 1,
                    output.role,
                    output.raw
                );
            }
        }

        prompt
    }

    /// Store this task's output
    ///
    /// Writes exactly once; a second call fails and leaves the first result
    /// in place. The error names this task's own position, whatever index the
    /// rejected output carries. Use [`Task::reset`] to rerun deliberately.
    pub fn mark_complete(&mut self, output: TaskOutput) -> Result<(), CrewError> {
        if let Some(existing) = &self.result {
            return Err(CrewError::AlreadyCompleted {
                task_index: self.position.unwrap_or(existing.task_index),
            });
        }
        self.result = Some(output);
        Ok(())
    }

    /// Clear the stored result
    pub fn reset(&mut self) {
        self.result = None;
    }
}
