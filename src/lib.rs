pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::ResearchError;
pub use generator::workflow::{execute, launch};
