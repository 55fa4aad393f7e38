pub mod client;

pub use client::types::{GenerationRole, ModelTier, QueryList};
pub use client::{Generator, LLMClient};
