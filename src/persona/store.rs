use super::models::Persona;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

const BUILTIN_PERSONAS: &str = include_str!("default_personas.toml");

const MIN_ARTISTS: usize = 5;
const MAX_ARTISTS: usize = 10;

#[derive(Deserialize)]
struct PersonaTable {
    #[serde(default)]
    personas: Vec<Persona>,
}

/// Read-only persona lookup table, built once at startup.
#[derive(Debug, Clone)]
pub struct PersonaStore {
    personas: Vec<Persona>,
    by_id: HashMap<String, usize>,
}

impl PersonaStore {
    /// The table shipped with the server.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PERSONAS).context("Failed to parse built-in persona table")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read personas file: {:?}", path))?;
        let store = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid personas file: {:?}", path))?;
        info!("Loaded {} personas from {:?}", store.len(), path);
        Ok(store)
    }

    /// Loads `path` when given, the built-in table otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: PersonaTable = toml::from_str(content)?;
        Self::new(table.personas)
    }

    pub fn new(personas: Vec<Persona>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(personas.len());

        for (index, persona) in personas.iter().enumerate() {
            if persona.id.trim().is_empty() {
                bail!("Persona at position {} has an empty id", index);
            }
            if persona.name.trim().is_empty() {
                bail!("Persona '{}' has an empty name", persona.id);
            }
            if persona.artists.is_empty() {
                bail!("Persona '{}' has no artists", persona.id);
            }
            if !(MIN_ARTISTS..=MAX_ARTISTS).contains(&persona.artists.len()) {
                warn!(
                    "Persona '{}' lists {} artists, expected between {} and {}",
                    persona.id,
                    persona.artists.len(),
                    MIN_ARTISTS,
                    MAX_ARTISTS
                );
            }
            if by_id.insert(persona.id.clone(), index).is_some() {
                bail!("Duplicate persona id: {}", persona.id);
            }
        }

        Ok(Self { personas, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.by_id.get(id).map(|&index| &self.personas[index])
    }

    /// All personas in table order.
    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
