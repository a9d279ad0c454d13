//! Sequential crew execution
//!
//! A crew runs its tasks strictly in order. Each task's prompt contains the
//! literal output of every task before it, so there is nothing to run in
//! parallel within one crew. Independent crews can run concurrently.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use swarm_providers::Completion;

use crate::error::{CrewError, RunError};
use crate::task::{Task, TaskOutput};
use crate::template::TemplateVars;

/// Per-crew execution settings
#[derive(Debug, Clone, Default)]
pub struct CrewConfig {
    /// Budget for each completion call (None = unbounded)
    pub completion_timeout: Option<Duration>,
}

/// Where a run is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running { task_index: usize },
    Succeeded,
    Failed { task_index: Option<usize>, cause: String },
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    /// Output of the last task
    pub final_output: String,
    /// Every task's output, in execution order
    pub task_outputs: Vec<TaskOutput>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrewOutput {
    /// The final stage's text
    pub fn raw(&self) -> &str {
        &self.final_output
    }

    /// Total time spent waiting on completions
    pub fn total_duration_ms(&self) -> u64 {
        self.task_outputs.iter().map(|o| o.duration_ms).sum()
    }
}

/// An ordered list of tasks bound to one objective
#[derive(Debug)]
pub struct Crew {
    vars: TemplateVars,
    tasks: Vec<Task>,
    config: CrewConfig,
    state: RunState,
}

impl Crew {
    /// Create a crew for an objective
    ///
    /// Each task's description is rendered with the objective here, before
    /// anything runs.
    pub fn new(objective: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self::with_inputs(TemplateVars::for_objective(objective), tasks)
    }

    /// Create a crew with extra named inputs besides the objective
    pub fn with_inputs(vars: TemplateVars, mut tasks: Vec<Task>) -> Self {
        for (position, task) in tasks.iter_mut().enumerate() {
            task.bind(&vars);
            task.set_position(position);
        }

        Self {
            vars,
            tasks,
            config: CrewConfig::default(),
            state: RunState::Pending,
        }
    }

    /// Set the execution settings
    pub fn with_config(mut self, config: CrewConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-call completion budget
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout = Some(timeout);
        self
    }

    pub fn objective(&self) -> &str {
        self.vars.objective().unwrap_or_default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Mutable access for pre-run augmentation
    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Clear all results and return to `Pending` for a deliberate rerun
    pub fn reset(&mut self) {
        for task in &mut self.tasks {
            task.reset();
        }
        self.state = RunState::Pending;
    }

    /// Run every task in order and return the last task's output
    ///
    /// Fails fast: the first error stops the run, no later task is called and
    /// no partial output is returned.
    pub async fn kickoff(&mut self, completion: &dyn Completion) -> Result<CrewOutput, RunError> {
        match self.execute(completion).await {
            Ok(output) => {
                self.state = RunState::Succeeded;
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(task_index = ?err.task_index, error = %err.source, "Crew run failed");
                self.state = RunState::Failed {
                    task_index: err.task_index,
                    cause: err.source.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Everything that can be checked before the first call
    fn validate(&self) -> Result<(), RunError> {
        if self.tasks.is_empty() {
            return Err(RunError::before_start(CrewError::EmptyPipeline));
        }

        for (index, task) in self.tasks.iter().enumerate() {
            task.agent()
                .model()
                .validate()
                .map_err(|e| RunError::at(index, e))?;

            if task.agent().role().trim().is_empty() {
                return Err(RunError::at(
                    index,
                    CrewError::Configuration("agent role is empty".to_string()),
                ));
            }

            if task.is_complete() {
                return Err(RunError::at(index, CrewError::AlreadyCompleted { task_index: index }));
            }
        }

        Ok(())
    }

    async fn execute(&mut self, completion: &dyn Completion) -> Result<CrewOutput, RunError> {
        self.validate()?;

        let started_at = Utc::now();
        let total = self.tasks.len();
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(total);

        tracing::info!(
            tasks = total,
            provider = completion.provider(),
            "Crew kickoff"
        );

        for index in 0..total {
            self.state = RunState::Running { task_index: index };

            let task = &self.tasks[index];
            let agent = task.agent();
            let prompt = task.build_prompt(&outputs);

            tracing::info!(
                task_index = index,
                role = agent.role(),
                model = %agent.model().model,
                "[Task {}/{}] started",
                index + 1,
                total
            );
            tracing::trace!(task_index = index, %prompt, "Task prompt");

            let step_start = Instant::now();
            let call = completion.complete(&prompt, agent.model());

            let raw = match self.config.completion_timeout {
                Some(after) => tokio::time::timeout(after, call)
                    .await
                    .map_err(|_| RunError::at(index, CrewError::CompletionTimeout { after }))?,
                None => call.await,
            }
            .map_err(|e| RunError::at(index, e))?;

            let duration_ms = step_start.elapsed().as_millis() as u64;

            let output = TaskOutput {
                task_index: index,
                role: agent.role().to_string(),
                description: task.effective_description(),
                raw,
                model: agent.model().model.clone(),
                duration_ms,
                completed_at: Utc::now(),
            };

            self.tasks[index]
                .mark_complete(output.clone())
                .map_err(|e| RunError::at(index, e))?;

            tracing::info!(
                task_index = index,
                duration_ms,
                output_chars = output.raw.len(),
                "[Task {}/{}] completed",
                index + 1,
                total
            );

            outputs.push(output);
        }

        let final_output = outputs
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();

        Ok(CrewOutput {
            final_output,
            task_outputs: outputs,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use swarm_providers::{CompletionError, ModelConfig};

    use crate::agent::Agent;

    /// Replies with canned text per call and records prompts
    struct Scripted {
        replies: Mutex<Vec<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Completion for Scripted {
        async fn complete(&self, prompt: &str, _model: &ModelConfig) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("unscripted".to_string()))
        }

        fn provider(&self) -> &str {
            "scripted"
        }
    }

    /// Never answers
    struct Stalled;

    #[async_trait]
    impl Completion for Stalled {
        async fn complete(&self, _prompt: &str, _model: &ModelConfig) -> Result<String, CompletionError> {
            std::future::pending().await
        }

        fn provider(&self) -> &str {
            "stalled"
        }
    }

    fn task(role: &str, description: &str) -> Task {
        let agent = Arc::new(Agent::new(role, "Work on {objective}", ModelConfig::new("test-model")));
        Task::new(description, "Plain text", agent)
    }

    #[tokio::test]
    async fn test_state_transitions_on_success() {
        let mut crew = Crew::new("x", vec![task("A", "one"), task("B", "two")]);
        assert_eq!(crew.state(), &RunState::Pending);

        let completion = Scripted::new(vec![Ok("1".into()), Ok("2".into())]);
        let output = crew.kickoff(&completion).await.unwrap();

        assert_eq!(output.raw(), "2");
        assert_eq!(crew.state(), &RunState::Succeeded);
        assert!(crew.tasks().iter().all(Task::is_complete));
    }

    #[tokio::test]
    async fn test_empty_crew() {
        let mut crew = Crew::new("x", vec![]);
        let completion = Scripted::new(vec![]);

        let err = crew.kickoff(&completion).await.unwrap_err();
        assert!(matches!(err.source, CrewError::EmptyPipeline));
        assert!(completion.prompts().is_empty());
        assert_eq!(
            crew.state(),
            &RunState::Failed { task_index: None, cause: "crew has no tasks".to_string() }
        );
    }

    #[tokio::test]
    async fn test_invalid_model_detected_before_any_call() {
        let bad = Arc::new(Agent::new("B", "goal", ModelConfig::new("")));
        let mut crew = Crew::new("x", vec![task("A", "one"), Task::new("two", "", bad)]);
        let completion = Scripted::new(vec![]);

        let err = crew.kickoff(&completion).await.unwrap_err();
        assert_eq!(err.task_index, Some(1));
        assert!(err.is_configuration());
        assert!(completion.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_fatal() {
        let mut crew = Crew::new("x", vec![task("A", "one"), task("B", "two")])
            .with_completion_timeout(Duration::from_millis(20));

        let err = crew.kickoff(&Stalled).await.unwrap_err();
        assert_eq!(err.task_index, Some(0));
        assert!(matches!(err.source, CrewError::CompletionTimeout { .. }));
        assert!(matches!(crew.state(), RunState::Failed { task_index: Some(0), .. }));
    }

    #[tokio::test]
    async fn test_rerun_requires_reset() {
        let mut crew = Crew::new("x", vec![task("A", "one")]);
        let completion = Scripted::new(vec![Ok("first".into()), Ok("second".into())]);

        crew.kickoff(&completion).await.unwrap();

        let err = crew.kickoff(&completion).await.unwrap_err();
        assert!(matches!(err.source, CrewError::AlreadyCompleted { task_index: 0 }));
        assert_eq!(completion.prompts().len(), 1);

        crew.reset();
        let output = crew.kickoff(&completion).await.unwrap();
        assert_eq!(output.raw(), "second");
    }

    #[tokio::test]
    async fn test_output_records_per_task_details() {
        let mut crew = Crew::new("rust", vec![task("A", "Study {objective}"), task("B", "two")]);
        let completion = Scripted::new(vec![Ok("alpha".into()), Ok("beta".into())]);

        let output = crew.kickoff(&completion).await.unwrap();
        assert_eq!(output.task_outputs.len(), 2);
        assert_eq!(output.task_outputs[0].role, "A");
        assert_eq!(output.task_outputs[0].description, "Study rust");
        assert_eq!(output.task_outputs[0].model, "test-model");
        assert_eq!(output.task_outputs[1].raw, "beta");
        assert!(output.started_at <= output.finished_at);
        assert_eq!(crew.objective(), "rust");
    }
}
