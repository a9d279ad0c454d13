//! Personas for the built-in crews
//!
//! Goals are templates: `{objective}` is filled in per run.

mod architect;
mod researcher;

pub use architect::{ARCHITECT_BACKSTORY, ARCHITECT_GOAL, ARCHITECT_ROLE};
pub use researcher::{RESEARCHER_BACKSTORY, RESEARCHER_GOAL, RESEARCHER_ROLE};
