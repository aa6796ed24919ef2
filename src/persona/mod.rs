//! Persona table: named listening profiles that shape the prompt.

mod models;
mod store;

pub use models::{Persona, PersonaSummary};
pub use store::PersonaStore;
