//! Error taxonomy for crew runs
//!
//! Every failure inside a run is a [`CrewError`]; `kickoff` and the engine
//! surface it wrapped in a single [`RunError`] carrying the failing task index.

use std::time::Duration;

use swarm_providers::CompletionError;

/// What went wrong
#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    /// Missing or invalid credentials, model settings or inputs
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("crew has no tasks")]
    EmptyPipeline,

    /// The completion call itself failed
    #[error("completion failed: {0}")]
    Completion(#[source] CompletionError),

    #[error("completion did not return within {after:?}")]
    CompletionTimeout { after: Duration },

    /// A result was written into a task that already has one
    #[error("task {task_index} already has a result")]
    AlreadyCompleted { task_index: usize },

    #[error("web search failed: {0}")]
    Search(String),

    #[error("invalid crew definition: {0}")]
    Definition(String),
}

impl From<CompletionError> for CrewError {
    fn from(err: CompletionError) -> Self {
        // Provider-side configuration problems are still configuration problems
        match err {
            CompletionError::Configuration(msg) => CrewError::Configuration(msg),
            other => CrewError::Completion(other),
        }
    }
}

/// The single error a failed run reports
#[derive(Debug)]
pub struct RunError {
    /// Index of the task that failed, when the failure belongs to one
    pub task_index: Option<usize>,
    pub source: CrewError,
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.task_index {
            Some(index) => write!(f, "run failed at task {}: {}", index, self.source),
            None => write!(f, "run failed: {}", self.source),
        }
    }
}

impl RunError {
    /// Failure attributed to a task
    pub fn at(task_index: usize, source: impl Into<CrewError>) -> Self {
        Self {
            task_index: Some(task_index),
            source: source.into(),
        }
    }

    /// Failure that happened before any task was selected
    pub fn before_start(source: impl Into<CrewError>) -> Self {
        Self {
            task_index: None,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> &CrewError {
        &self.source
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self.source,
            CrewError::Configuration(_) | CrewError::Definition(_)
        )
    }

    /// Provider failure or timeout
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self.source,
            CrewError::Completion(_) | CrewError::CompletionTimeout { .. }
        )
    }
}
