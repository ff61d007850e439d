pub mod approval;
pub mod bootstrap;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod tools;

pub use bootstrap::Services;
pub use config::Config;
pub use orchestrator::{Orchestrator, OrchestratorError};
