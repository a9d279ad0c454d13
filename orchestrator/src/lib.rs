//! Sequential multi-agent crew orchestration
//!
//! This crate provides:
//! - Agents with a role, goal, backstory and per-agent model settings
//! - Tasks bound to agents, composed into prompts with prior outputs as context
//! - Crews that run tasks strictly in order and fail fast
//! - Built-in and custom TOML crew definitions
//! - A swarm engine that resolves definitions by name and runs them
//!
//! # Example
//!
//! ```rust,ignore
//! use swarm_orchestrator::{EngineConfig, SwarmEngine};
//!
//! let engine = SwarmEngine::new(completion, EngineConfig::default());
//!
//! let output = engine
//!     .run("research-roadmap", "AI Agents in 2026")
//!     .await?;
//! println!("{}", output.raw());
//! ```

pub mod agent;
pub mod crew;
pub mod definition;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod task;
pub mod template;

pub use agent::Agent;
pub use crew::{Crew, CrewConfig, CrewOutput, RunState};
pub use definition::{AgentSpec, CrewDefinition, TaskSpec};
pub use engine::{CrewCatalog, EngineConfig, SwarmEngine};
pub use error::{CrewError, RunError};
pub use task::{Task, TaskOutput};
pub use template::TemplateVars;

/// Re-export commonly used types from the providers crate
pub use swarm_providers::{Completion, CompletionError, ModelConfig, SearchBackend};
