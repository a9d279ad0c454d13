//! Agent personas
//!
//! An [`Agent`] is an immutable descriptor of a reasoning role: who is
//! speaking, what they are after, and which model speaks for them. Agents
//! hold no run state and are shared as `Arc<Agent>` between tasks and
//! between concurrent runs.

use serde::Serialize;
use swarm_providers::ModelConfig;

use crate::template::{self, TemplateVars};

/// Instruction appended to personas that may not delegate
const ANSWER_DIRECTLY: &str =
    "You work alone on this task: do not delegate or defer to other agents. \
     Answer directly from your own expertise and the context you are given.";

/// Immutable reasoning role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    role: String,
    goal: String,
    backstory: String,
    allow_delegation: bool,
    model: ModelConfig,
}

impl Agent {
    /// Create a new agent
    ///
    /// `goal` is a template; `{objective}` is filled in when the persona is
    /// composed for a run.
    pub fn new(role: impl Into<String>, goal: impl Into<String>, model: ModelConfig) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: String::new(),
            allow_delegation: false,
            model,
        }
    }

    /// Set the backstory
    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Allow or forbid delegation
    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// The goal template, placeholders unrendered
    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Render the "who is speaking" part of every prompt for this agent
    pub fn compose_persona_prompt(&self, objective: &str) -> String {
        self.compose_persona_prompt_with(&TemplateVars::for_objective(objective))
    }

    /// Same as [`Agent::compose_persona_prompt`] with extra named inputs
    pub fn compose_persona_prompt_with(&self, vars: &TemplateVars) -> String {
        let mut prompt = format!("You are {}.", self.role);

        let backstory = self.backstory.trim();
        if !backstory.is_empty() {
            prompt.push('\n');
            prompt.push_str(backstory);
        }

        prompt.push_str("\n\nYour personal goal is: ");
        prompt.push_str(&template::render(&self.goal, vars));

        if !self.allow_delegation {
            prompt.push_str("\n\n");
            prompt.push_str(ANSWER_DIRECTLY);
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn researcher() -> Agent {
        Agent::new("Researcher", "Analyze {objective}", ModelConfig::new("gpt-4o"))
            .with_backstory("Advanced AI entity designed for high-speed information synthesis.")
    }

    #[test]
    fn test_agent_builder() {
        let agent = researcher().with_delegation(true);

        assert_eq!(agent.role(), "Researcher");
        assert_eq!(agent.goal(), "Analyze {objective}");
        assert!(agent.allow_delegation());
        assert_eq!(agent.model().model, "gpt-4o");
    }

    #[test]
    fn test_persona_renders_role_goal_backstory() {
        let prompt = researcher().compose_persona_prompt("AI Agents 2026");

        assert!(prompt.starts_with("You are Researcher.\nAdvanced AI entity"));
        assert!(prompt.contains("Your personal goal is: Analyze AI Agents 2026"));
        assert!(prompt.contains(ANSWER_DIRECTLY));
    }

    #[test]
    fn test_persona_is_deterministic() {
        let agent = researcher();
        assert_eq!(
            agent.compose_persona_prompt("x"),
            agent.compose_persona_prompt("x")
        );
    }

    #[test]
    fn test_goal_without_placeholder_passes_through() {
        let agent = Agent::new("Architect", "Design systems", ModelConfig::new("m"));
        let prompt = agent.compose_persona_prompt("ignored");
        assert!(prompt.contains("Your personal goal is: Design systems"));
        assert!(!prompt.contains("ignored"));
    }

    #[test]
    fn test_delegating_agent_omits_direct_answer_instruction() {
        let prompt = researcher().with_delegation(true).compose_persona_prompt("x");
        assert!(!prompt.contains(ANSWER_DIRECTLY));
    }

    #[test]
    fn test_empty_backstory_is_skipped() {
        let agent = Agent::new("Writer", "Write about {objective}", ModelConfig::new("m"));
        assert!(agent
            .compose_persona_prompt("rust")
            .starts_with("You are Writer.\n\nYour personal goal is: Write about rust"));
    }
}
