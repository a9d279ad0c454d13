//! Swarm engine
//!
//! Resolves crew definitions by name and runs them with:
//! - One shared completion client for every run
//! - Optional web search augmentation of flagged tasks
//! - Per-call completion timeout

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use swarm_providers::{Completion, ModelConfig, SearchBackend, SwarmFileConfig};

use crate::crew::{CrewConfig, CrewOutput};
use crate::definition::{builtin_definitions, load_custom_definitions, CrewDefinition};
use crate::error::{CrewError, RunError};

/// Configuration for the swarm engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model settings for agents that don't specify their own
    pub default_model: ModelConfig,

    /// Budget for each completion call
    pub completion_timeout: Option<Duration>,

    /// Directory for custom crew definitions
    pub custom_crews_dir: Option<PathBuf>,

    /// How many search results to inject per task
    pub max_search_results: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let file_config = SwarmFileConfig::default();
        Self::from_file_config(&file_config)
    }
}

impl EngineConfig {
    /// Create from file config
    pub fn from_file_config(config: &SwarmFileConfig) -> Self {
        Self {
            default_model: config.llm.model_config(),
            completion_timeout: config.llm.timeout(),
            custom_crews_dir: None,
            max_search_results: config.search.max_results,
        }
    }
}

/// Built-in and custom crew definitions, resolved by name
#[derive(Debug, Clone, Default)]
pub struct CrewCatalog {
    builtin_crews: HashMap<String, CrewDefinition>,

    /// Custom definitions loaded from files
    custom_crews: HashMap<String, CrewDefinition>,
}

impl CrewCatalog {
    /// Only the built-in crews, no file lookups
    pub fn builtin() -> Self {
        Self {
            builtin_crews: builtin_definitions(),
            custom_crews: HashMap::new(),
        }
    }

    /// Built-ins plus custom definitions from the standard locations
    ///
    /// Later sources override earlier ones: `~/.config/swarm/crews`, then
    /// `./.swarm/crews`, then `custom_dir`.
    pub fn discover(custom_dir: Option<&Path>) -> Self {
        let mut catalog = Self::builtin();

        if let Some(config_dir) = dirs::config_dir() {
            let global_crews = config_dir.join("swarm").join("crews");
            if global_crews.exists() {
                catalog = catalog.with_dir(&global_crews);
            }
        }

        if let Ok(cwd) = std::env::current_dir() {
            let local_crews = cwd.join(".swarm").join("crews");
            if local_crews.exists() {
                catalog = catalog.with_dir(&local_crews);
            }
        }

        match custom_dir {
            Some(dir) => catalog.with_dir(dir),
            None => catalog,
        }
    }

    /// Add the `*.toml` definitions in `dir`, replacing same-named ones
    pub fn with_dir(mut self, dir: &Path) -> Self {
        match load_custom_definitions(dir) {
            Ok(definitions) => self.custom_crews.extend(definitions),
            Err(e) => tracing::warn!("Failed to load custom crews: {}", e),
        }
        self
    }

    /// Register a definition programmatically (takes precedence over built-ins)
    pub fn register(&mut self, definition: CrewDefinition) -> Result<(), CrewError> {
        definition.validate()?;
        self.custom_crews.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Get a definition by name (checks custom first, then built-in)
    pub fn get(&self, name: &str) -> Option<&CrewDefinition> {
        self.custom_crews
            .get(name)
            .or_else(|| self.builtin_crews.get(name))
    }

    /// List all available crews as (name, description, is_custom)
    pub fn list(&self) -> Vec<(&str, &str, bool)> {
        let mut crews: Vec<_> = self
            .builtin_crews
            .iter()
            .filter(|(name, _)| !self.custom_crews.contains_key(*name))
            .map(|(name, d)| (name.as_str(), d.description.as_str(), false))
            .collect();

        crews.extend(
            self.custom_crews
                .iter()
                .map(|(name, d)| (name.as_str(), d.description.as_str(), true)),
        );

        crews.sort_by_key(|(name, _, _)| *name);
        crews
    }
}

/// Runs named crews against shared capabilities
pub struct SwarmEngine {
    completion: Arc<dyn Completion>,

    search: Option<Arc<dyn SearchBackend>>,

    config: EngineConfig,

    catalog: CrewCatalog,
}

impl SwarmEngine {
    /// Create a new engine, discovering custom crews from the standard locations
    pub fn new(completion: Arc<dyn Completion>, config: EngineConfig) -> Self {
        let catalog = CrewCatalog::discover(config.custom_crews_dir.as_deref());
        Self::with_catalog(completion, config, catalog)
    }

    /// Create an engine over an explicit catalog
    pub fn with_catalog(
        completion: Arc<dyn Completion>,
        config: EngineConfig,
        catalog: CrewCatalog,
    ) -> Self {
        Self {
            completion,
            search: None,
            config,
            catalog,
        }
    }

    /// Enable web search augmentation
    pub fn with_search(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(backend);
        self
    }

    /// Register a definition programmatically
    pub fn register(&mut self, definition: CrewDefinition) -> Result<(), CrewError> {
        self.catalog.register(definition)
    }

    /// Get a definition by name
    pub fn get_definition(&self, name: &str) -> Option<&CrewDefinition> {
        self.catalog.get(name)
    }

    /// List all available crews as (name, description, is_custom)
    pub fn list_definitions(&self) -> Vec<(&str, &str, bool)> {
        self.catalog.list()
    }

    /// Run a crew by name
    pub async fn run(&self, crew_name: &str, objective: &str) -> Result<CrewOutput, RunError> {
        self.run_with_inputs(crew_name, objective, &BTreeMap::new()).await
    }

    /// Run a crew by name with extra named inputs
    pub async fn run_with_inputs(
        &self,
        crew_name: &str,
        objective: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<CrewOutput, RunError> {
        let definition = self.get_definition(crew_name).ok_or_else(|| {
            RunError::before_start(CrewError::Configuration(format!(
                "crew '{}' not found",
                crew_name
            )))
        })?;

        self.execute(definition, objective, inputs).await
    }

    /// Instantiate a definition for an objective and run it
    pub async fn execute(
        &self,
        definition: &CrewDefinition,
        objective: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<CrewOutput, RunError> {
        if objective.trim().is_empty() {
            return Err(RunError::before_start(CrewError::Configuration(
                "objective is empty".to_string(),
            )));
        }

        tracing::info!(crew = %definition.name, objective, "Starting crew");

        let mut crew = definition
            .instantiate_with(objective, inputs, &self.config.default_model)
            .map_err(RunError::before_start)?
            .with_config(CrewConfig {
                completion_timeout: self.config.completion_timeout,
            });

        let vars = definition.inputs_for(objective, inputs);
        for (index, spec) in definition.tasks.iter().enumerate() {
            if !spec.search {
                continue;
            }

            let Some(search) = &self.search else {
                tracing::debug!(task_index = index, "Search requested but no backend configured");
                continue;
            };

            let query = spec.search_query(&vars);
            let results = search
                .search(&query, self.config.max_search_results)
                .await
                .map_err(|e| RunError::at(index, CrewError::Search(e.to_string())))?;

            tracing::info!(
                task_index = index,
                backend = search.name(),
                results = results.results.len(),
                "Augmented task with search results"
            );

            crew.tasks_mut()[index].push_context(results.to_context());
        }

        let output = crew.kickoff(self.completion.as_ref()).await?;

        tracing::info!(
            crew = %definition.name,
            tasks = output.task_outputs.len(),
            duration_ms = output.total_duration_ms(),
            "Crew completed"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use swarm_providers::{CompletionError, SearchResult, SearchResults};

    use crate::definition::{AgentSpec, TaskSpec};

    struct Echo {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Completion for Echo {
        async fn complete(&self, prompt: &str, model: &ModelConfig) -> Result<String, CompletionError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("reply {} from {}", prompts.len(), model.model))
        }

        fn provider(&self) -> &str {
            "echo"
        }
    }

    struct FixedSearch {
        fail: bool,
    }

    #[async_trait]
    impl SearchBackend for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, query: &str, limit: usize) -> anyhow::Result<SearchResults> {
            if self.fail {
                anyhow::bail!("search backend down");
            }
            Ok(SearchResults {
                query: query.to_string(),
                results: (0..limit)
                    .map(|i| SearchResult {
                        title: format!("Hit {}", i),
                        url: format!("https://hit{}.example", i),
                        description: format!("snippet {}", i),
                    })
                    .collect(),
                backend: "fixed".to_string(),
            })
        }
    }

    fn engine() -> (SwarmEngine, Arc<Echo>) {
        let echo = Arc::new(Echo {
            prompts: Mutex::new(Vec::new()),
        });
        let config = EngineConfig {
            default_model: ModelConfig::new("test-model"),
            completion_timeout: Some(Duration::from_secs(5)),
            custom_crews_dir: None,
            max_search_results: 2,
        };
        (SwarmEngine::with_catalog(echo.clone(), config, CrewCatalog::builtin()), echo)
    }

    #[test]
    fn test_list_definitions() {
        let (engine, _) = engine();

        let crews = engine.list_definitions();
        let names: Vec<_> = crews.iter().map(|(n, _, _)| *n).collect();

        assert!(names.contains(&"research-roadmap"));
        assert!(names.contains(&"trend-analysis"));
    }

    #[test]
    fn test_registered_definition_shadows_builtin() {
        let (mut engine, _) = engine();
        engine
            .register(
                CrewDefinition::new("research-roadmap")
                    .with_description("custom")
                    .with_agent(AgentSpec::new("a", "A", "goal"))
                    .with_task(TaskSpec::new("a", "do", "")),
            )
            .unwrap();

        assert_eq!(engine.get_definition("research-roadmap").unwrap().description, "custom");
        let listed: Vec<_> = engine
            .list_definitions()
            .into_iter()
            .filter(|(n, _, _)| *n == "research-roadmap")
            .collect();
        assert_eq!(listed, vec![("research-roadmap", "custom", true)]);
    }

    #[test]
    fn test_builtin_catalog_ignores_files() {
        let catalog = CrewCatalog::builtin();
        let crews = catalog.list();

        let names: Vec<_> = crews.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(names, vec!["research-roadmap", "trend-analysis"]);
        assert!(crews.iter().all(|(_, _, is_custom)| !is_custom));
        assert_eq!(catalog.get("trend-analysis").unwrap().tasks.len(), 2);
    }

    #[test]
    fn test_catalog_loads_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("trend-analysis.toml"),
            r#"
                name = "trend-analysis"
                description = "Local override"
                [[agents]]
                name = "a"
                role = "A"
                goal = "Do {objective}"
                [[tasks]]
                agent = "a"
                description = "Go"
            "#,
        )
        .unwrap();

        let catalog = CrewCatalog::builtin().with_dir(dir.path());
        assert_eq!(catalog.get("trend-analysis").unwrap().description, "Local override");
        assert!(catalog.get("research-roadmap").is_some());
        assert!(catalog
            .list()
            .contains(&("trend-analysis", "Local override", true)));
    }

    #[tokio::test]
    async fn test_run_builtin() {
        let (engine, echo) = engine();

        let output = engine.run("trend-analysis", "AI Agents 2026").await.unwrap();

        assert_eq!(output.final_output, "reply 2 from test-model");
        let prompts = echo.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Identify 3 trends in AI Agents 2026"));
        assert!(prompts[1].contains("reply 1 from test-model"));
    }

    #[tokio::test]
    async fn test_unknown_crew() {
        let (engine, echo) = engine();
        let err = engine.run("nope", "x").await.unwrap_err();
        assert!(err.is_configuration());
        assert!(echo.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_objective_rejected() {
        let (engine, echo) = engine();
        let err = engine.run("trend-analysis", "   ").await.unwrap_err();
        assert!(err.is_configuration());
        assert!(echo.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_results_injected() {
        let (engine, echo) = engine();
        let engine = engine.with_search(Arc::new(FixedSearch { fail: false }));

        engine.run("research-roadmap", "AI Agents 2026").await.unwrap();

        let prompts = echo.prompts.lock().unwrap();
        assert!(prompts[0].contains("Web search results for \"AI Agents 2026\":"));
        assert!(prompts[0].contains("1. Hit 0 (https://hit0.example)"));
        assert!(prompts[0].contains("2. Hit 1 (https://hit1.example)"));
        assert!(!prompts[0].contains("Hit 2"));
        assert!(!prompts[1].contains("Web search results"));
    }

    #[tokio::test]
    async fn test_search_failure_is_fatal() {
        let (engine, echo) = engine();
        let engine = engine.with_search(Arc::new(FixedSearch { fail: true }));

        let err = engine.run("research-roadmap", "AI Agents 2026").await.unwrap_err();
        assert_eq!(err.task_index, Some(0));
        assert!(matches!(err.source, CrewError::Search(_)));
        assert!(echo.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_skipped_without_backend() {
        let (engine, echo) = engine();
        engine.run("research-roadmap", "AI Agents 2026").await.unwrap();
        assert!(!echo.prompts.lock().unwrap()[0].contains("Web search results"));
    }
}
