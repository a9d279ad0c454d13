//! Crew definitions
//!
//! A definition describes agents and tasks declaratively, with `{objective}`
//! (and any other named input) left as placeholders. Definitions come from
//! the built-in set or from TOML files:
//!
//! ```toml
//! name = "research-roadmap"
//! description = "Research a topic, then turn it into a roadmap"
//!
//! [[agents]]
//! name = "researcher"
//! role = "Neural Researcher"
//! goal = "Uncover deep technical insights about {objective}"
//! backstory = "..."
//!
//! [[tasks]]
//! agent = "researcher"
//! description = "Research latest trends in {objective}."
//! expected_output = "List of 5 technical insights."
//! search = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use swarm_providers::ModelConfig;

use crate::agent::Agent;
use crate::crew::Crew;
use crate::error::CrewError;
use crate::prompts;
use crate::task::Task;
use crate::template::{self, TemplateVars};

/// An agent entry in a definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Key tasks use to refer to this agent
    pub name: String,

    pub role: String,

    /// Goal template (can use {objective} and named inputs)
    pub goal: String,

    #[serde(default)]
    pub backstory: String,

    #[serde(default)]
    pub allow_delegation: bool,

    /// Optional: override the default model
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl AgentSpec {
    /// Create an agent entry
    pub fn new(name: impl Into<String>, role: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: String::new(),
            allow_delegation: false,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the backstory
    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Model settings after applying this entry's overrides
    pub fn model_config(&self, default_model: &ModelConfig) -> ModelConfig {
        ModelConfig {
            model: self.model.clone().unwrap_or_else(|| default_model.model.clone()),
            temperature: self.temperature.unwrap_or(default_model.temperature),
            max_tokens: self.max_tokens.or(default_model.max_tokens),
        }
    }

    fn build(&self, default_model: &ModelConfig) -> Agent {
        Agent::new(&self.role, &self.goal, self.model_config(default_model))
            .with_backstory(&self.backstory)
            .with_delegation(self.allow_delegation)
    }
}

/// A task entry in a definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Name of the agent to run (must exist in `agents`)
    pub agent: String,

    /// Description template (can use {objective} and named inputs)
    pub description: String,

    #[serde(default)]
    pub expected_output: String,

    /// Augment the description with web search results before running
    #[serde(default)]
    pub search: bool,

    /// Query template for the search (defaults to the objective)
    #[serde(default)]
    pub search_query: Option<String>,
}

impl TaskSpec {
    /// Create a task entry
    pub fn new(
        agent: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            search: false,
            search_query: None,
        }
    }

    /// Mark this task for web search augmentation
    pub fn with_search(mut self) -> Self {
        self.search = true;
        self
    }

    /// The rendered search query for a run
    pub fn search_query(&self, vars: &TemplateVars) -> String {
        let query = self
            .search_query
            .as_deref()
            .unwrap_or(template::OBJECTIVE_PLACEHOLDER);
        template::render(query, vars)
    }
}

/// A complete crew definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewDefinition {
    /// Unique identifier for this crew
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub agents: Vec<AgentSpec>,

    /// Tasks, in execution order
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,

    /// Default values for named inputs besides {objective}
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl CrewDefinition {
    /// Create a new definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            agents: Vec::new(),
            tasks: Vec::new(),
            inputs: BTreeMap::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Add an agent
    pub fn with_agent(mut self, agent: AgentSpec) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add a task
    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Load definition from TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, CrewError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CrewError::Definition(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Load definition from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, CrewError> {
        let definition: Self =
            toml::from_str(toml_str).map_err(|e| CrewError::Definition(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Structural checks: every task names a known agent, names are unique
    pub fn validate(&self) -> Result<(), CrewError> {
        if self.name.trim().is_empty() {
            return Err(CrewError::Definition("crew name is empty".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(CrewError::Definition(format!("crew '{}' has no tasks", self.name)));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.role.trim().is_empty() {
                return Err(CrewError::Definition(format!(
                    "agent '{}' has an empty role",
                    agent.name
                )));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(CrewError::Definition(format!(
                    "agent '{}' is defined twice",
                    agent.name
                )));
            }
        }

        for (index, task) in self.tasks.iter().enumerate() {
            if !seen.contains(task.agent.as_str()) {
                return Err(CrewError::Definition(format!(
                    "task {} refers to unknown agent '{}'",
                    index, task.agent
                )));
            }
        }

        Ok(())
    }

    /// Template inputs for a run: definition defaults, then overrides, then the objective
    pub fn inputs_for(&self, objective: &str, overrides: &BTreeMap<String, String>) -> TemplateVars {
        let mut vars = TemplateVars::new();
        for (name, value) in self.inputs.iter().chain(overrides.iter()) {
            vars.insert(name.as_str(), value.as_str());
        }
        vars.insert(template::OBJECTIVE, objective);
        vars
    }

    /// Build a crew for an objective
    pub fn instantiate(&self, objective: &str, default_model: &ModelConfig) -> Result<Crew, CrewError> {
        self.instantiate_with(objective, &BTreeMap::new(), default_model)
    }

    /// Build a crew for an objective with extra named inputs
    ///
    /// Agents are built once and shared by every task that names them.
    pub fn instantiate_with(
        &self,
        objective: &str,
        overrides: &BTreeMap<String, String>,
        default_model: &ModelConfig,
    ) -> Result<Crew, CrewError> {
        self.validate()?;

        let agents: HashMap<&str, Arc<Agent>> = self
            .agents
            .iter()
            .map(|spec| (spec.name.as_str(), Arc::new(spec.build(default_model))))
            .collect();

        let tasks = self
            .tasks
            .iter()
            .map(|spec| {
                // validate() guarantees the lookup succeeds
                let agent = agents
                    .get(spec.agent.as_str())
                    .cloned()
                    .ok_or_else(|| CrewError::Definition(format!("unknown agent '{}'", spec.agent)))?;
                Ok(Task::new(&spec.description, &spec.expected_output, agent))
            })
            .collect::<Result<Vec<_>, CrewError>>()?;

        let vars = self.inputs_for(objective, overrides);
        for task in &self.tasks {
            for name in template::unknown_placeholders(&task.description, &vars) {
                tracing::debug!(crew = %self.name, placeholder = name, "Placeholder left unrendered");
            }
        }

        Ok(Crew::with_inputs(vars, tasks))
    }
}

/// Collection of built-in crews
pub fn builtin_definitions() -> HashMap<String, CrewDefinition> {
    let mut definitions = HashMap::new();

    let researcher = AgentSpec::new("researcher", prompts::RESEARCHER_ROLE, prompts::RESEARCHER_GOAL)
        .with_backstory(prompts::RESEARCHER_BACKSTORY);
    let architect = AgentSpec::new("architect", prompts::ARCHITECT_ROLE, prompts::ARCHITECT_GOAL)
        .with_backstory(prompts::ARCHITECT_BACKSTORY);

    // Research, then blueprint
    definitions.insert(
        "research-roadmap".to_string(),
        CrewDefinition::new("research-roadmap")
            .with_description("Research the latest trends, then turn them into a technical roadmap")
            .with_agent(researcher.clone())
            .with_agent(architect.clone())
            .with_task(
                TaskSpec::new(
                    "researcher",
                    "Research latest trends in {objective}.",
                    "List of 5 technical insights.",
                )
                .with_search(),
            )
            .with_task(TaskSpec::new(
                "architect",
                "Create a technical roadmap based on research.",
                "A structured Markdown roadmap.",
            )),
    );

    // Short trend scan, then roadmap
    definitions.insert(
        "trend-analysis".to_string(),
        CrewDefinition::new("trend-analysis")
            .with_description("Identify three trends and synthesize them into a roadmap")
            .with_agent(researcher.with_temperature(0.3))
            .with_agent(architect)
            .with_task(TaskSpec::new(
                "researcher",
                "Identify 3 trends in {objective}",
                "3 bullet points",
            ))
            .with_task(TaskSpec::new(
                "architect",
                "Synthesize the trends above into a strategic roadmap for {objective}",
                "Markdown roadmap",
            )),
    );

    definitions
}

/// Load custom definitions from a directory
///
/// Files that fail to parse are skipped with a warning.
pub fn load_custom_definitions(dir: &Path) -> Result<HashMap<String, CrewDefinition>, CrewError> {
    let mut definitions = HashMap::new();

    if !dir.exists() {
        return Ok(definitions);
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| CrewError::Definition(format!("{}: {}", dir.display(), e)))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            match CrewDefinition::from_toml_file(&path) {
                Ok(definition) => {
                    definitions.insert(definition.name.clone(), definition);
                }
                Err(e) => {
                    tracing::warn!("Failed to load crew definition from {:?}: {}", path, e);
                }
            }
        }
    }

    Ok(definitions)
}
