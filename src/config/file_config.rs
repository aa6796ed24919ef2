use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub personas_file: Option<String>,

    // Feature configs
    pub llm: Option<LlmConfig>,
    pub catalog: Option<CatalogConfig>,
    pub rate_limit: Option<RateLimitConfig>,
    pub content: Option<ContentConfig>,
    pub server: Option<ServerSectionConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Shell command whose stdout is the API key.
    pub api_key_command: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// "spotify" or "none"
    pub provider: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub market: Option<String>,
    pub timeout_secs: Option<u64>,
    pub enrichment_concurrency: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: Option<u32>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ContentConfig {
    pub max_input_length: Option<usize>,
    pub song_count: Option<usize>,
    pub max_favorite_artist_songs: Option<usize>,
    pub injection_phrases: Option<Vec<String>>,
    pub content_denylist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ServerSectionConfig {
    /// Header carrying a stable per-client key, set by an upstream session layer.
    pub client_id_header: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
port = 4000
logging_level = "headers"

[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_command = "pass show openai"
temperature = 0.5

[catalog]
provider = "spotify"
client_id = "id"
client_secret = "secret"
market = "GB"

[rate_limit]
max_requests = 5

[content]
content_denylist = ["banned"]

[server]
client_id_header = "x-session-id"
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.logging_level.as_deref(), Some("headers"));

        let llm = config.llm.unwrap();
        assert_eq!(llm.provider.as_deref(), Some("openai"));
        assert_eq!(llm.api_key_command.as_deref(), Some("pass show openai"));
        assert_eq!(llm.temperature, Some(0.5));
        assert!(llm.api_key.is_none());

        let catalog = config.catalog.unwrap();
        assert_eq!(catalog.market.as_deref(), Some("GB"));
        assert_eq!(config.rate_limit.unwrap().max_requests, Some(5));
        assert_eq!(
            config.content.unwrap().content_denylist,
            Some(vec!["banned".to_string()])
        );
        assert_eq!(
            config.server.unwrap().client_id_header.as_deref(),
            Some("x-session-id")
        );
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.port.is_none());
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "port = \"not a number").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/moodmix.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
