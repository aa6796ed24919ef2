//! Moodmix Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog_search;
pub mod config;
pub mod llm;
pub mod persona;
pub mod recommendation;
pub mod server;

// Re-export commonly used types for convenience
pub use persona::{Persona, PersonaStore};
pub use recommendation::{RecommendationRequest, RecommendationResult, RecommendationService};
pub use server::{run_server, RequestsLoggingLevel};
