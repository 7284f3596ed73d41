pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod search;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use config::Config;
pub use error::{ScoutError, ScoutResult};
pub use types::{RecommendationResult, ToolRecord};
pub use workflow::{Workflow, WorkflowContext, WorkflowState};
