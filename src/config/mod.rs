mod file_config;

pub use file_config::{
    CatalogConfig, ContentConfig, FileConfig, LlmConfig, RateLimitConfig, ServerSectionConfig,
};

use crate::recommendation::{
    DEFAULT_CONTENT_DENYLIST, DEFAULT_INJECTION_PHRASES, INVALID_INPUT, MAX_RATE_LIMIT_WINDOW,
};
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub personas_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// None means the built-in persona table.
    pub personas_file: Option<PathBuf>,
    pub client_id_header: Option<String>,

    // Collaborators
    pub llm: LlmSettings,
    pub catalog: CatalogSettings,
    pub enrichment_concurrency: usize,

    // Pipeline policy
    pub rate_limit: RateLimitSettings,
    pub content: ContentSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            api_key: None,
            api_key_command: None,
            temperature: 0.8,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogSettings {
    #[default]
    None,
    Spotify {
        client_id: String,
        client_secret: String,
        market: Option<String>,
        timeout_secs: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentSettings {
    pub max_input_length: usize,
    pub song_count: usize,
    pub max_favorite_artist_songs: usize,
    pub injection_phrases: Vec<String>,
    pub content_denylist: Vec<String>,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            max_input_length: 250,
            song_count: 10,
            max_favorite_artist_songs: 2,
            injection_phrases: to_strings(DEFAULT_INJECTION_PHRASES),
            content_denylist: to_strings(DEFAULT_CONTENT_DENYLIST),
        }
    }
}

const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 4;
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let personas_file = file
            .personas_file
            .map(PathBuf::from)
            .or_else(|| cli.personas_file.clone());
        if let Some(path) = &personas_file {
            if !path.is_file() {
                bail!("Personas file does not exist: {:?}", path);
            }
        }

        let client_id_header = file
            .server
            .and_then(|s| s.client_id_header)
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty());

        let llm = resolve_llm(file.llm.unwrap_or_default())?;

        let catalog_file = file.catalog.unwrap_or_default();
        let enrichment_concurrency = catalog_file
            .enrichment_concurrency
            .unwrap_or(DEFAULT_ENRICHMENT_CONCURRENCY);
        if enrichment_concurrency == 0 {
            bail!("catalog.enrichment_concurrency must be at least 1");
        }
        let catalog = resolve_catalog(catalog_file)?;

        let rl_file = file.rate_limit.unwrap_or_default();
        let rate_limit = RateLimitSettings {
            max_requests: rl_file.max_requests.unwrap_or(20),
            window: Duration::from_secs(rl_file.window_secs.unwrap_or(3600)),
        };
        if rate_limit.max_requests == 0 {
            bail!("rate_limit.max_requests must be greater than 0");
        }
        if rate_limit.window.is_zero() {
            bail!("rate_limit.window_secs must be greater than 0");
        }
        if rate_limit.window > MAX_RATE_LIMIT_WINDOW {
            bail!(
                "rate_limit.window_secs must be at most {}",
                MAX_RATE_LIMIT_WINDOW.as_secs()
            );
        }

        let content_file = file.content.unwrap_or_default();
        let defaults = ContentSettings::default();
        let content = ContentSettings {
            max_input_length: content_file
                .max_input_length
                .unwrap_or(defaults.max_input_length),
            song_count: content_file.song_count.unwrap_or(defaults.song_count),
            max_favorite_artist_songs: content_file
                .max_favorite_artist_songs
                .unwrap_or(defaults.max_favorite_artist_songs),
            injection_phrases: content_file
                .injection_phrases
                .map(normalize_phrases)
                .unwrap_or(defaults.injection_phrases),
            content_denylist: content_file
                .content_denylist
                .map(normalize_phrases)
                .unwrap_or(defaults.content_denylist),
        };
        if content.max_input_length < INVALID_INPUT.len() {
            bail!(
                "content.max_input_length must be at least {}",
                INVALID_INPUT.len()
            );
        }
        if content.song_count == 0 {
            bail!("content.song_count must be greater than 0");
        }

        Ok(Self {
            port,
            logging_level,
            frontend_dir_path,
            personas_file,
            client_id_header,
            llm,
            catalog,
            enrichment_concurrency,
            rate_limit,
            content,
        })
    }
}

fn resolve_llm(file: LlmConfig) -> Result<LlmSettings> {
    let provider = file
        .provider
        .map(|p| p.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "ollama".to_string());

    let (default_url, default_model) = match provider.as_str() {
        "ollama" => ("http://localhost:11434", "llama3.1:8b"),
        "openai" => ("https://api.openai.com/v1", "gpt-4o-mini"),
        other => bail!("Unknown LLM provider: {} (expected \"openai\" or \"ollama\")", other),
    };

    let temperature = file.temperature.unwrap_or(0.8);
    if !(0.0..=2.0).contains(&temperature) {
        bail!("llm.temperature must be between 0.0 and 2.0, got {}", temperature);
    }

    Ok(LlmSettings {
        base_url: file.base_url.unwrap_or_else(|| default_url.to_string()),
        model: file.model.unwrap_or_else(|| default_model.to_string()),
        api_key: file.api_key,
        api_key_command: file.api_key_command,
        temperature,
        max_tokens: file.max_tokens,
        timeout_secs: file.timeout_secs.unwrap_or(60),
        provider,
    })
}

fn resolve_catalog(file: CatalogConfig) -> Result<CatalogSettings> {
    let provider = file
        .provider
        .map(|p| p.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "none".to_string());

    match provider.as_str() {
        "none" => Ok(CatalogSettings::None),
        "spotify" => {
            let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret)
            else {
                bail!("catalog provider \"spotify\" requires client_id and client_secret");
            };
            Ok(CatalogSettings::Spotify {
                client_id,
                client_secret,
                market: file.market,
                timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_CATALOG_TIMEOUT_SECS),
            })
        }
        other => bail!(
            "Unknown catalog provider: {} (expected \"spotify\" or \"none\")",
            other
        ),
    }
}

fn normalize_phrases(phrases: Vec<String>) -> Vec<String> {
    phrases
        .into_iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            port: 3001,
            logging_level: RequestsLoggingLevel::Path,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&cli(), None).unwrap();

        assert_eq!(config.port, 3001);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Path);
        assert!(config.personas_file.is_none());
        assert!(config.client_id_header.is_none());
        assert_eq!(config.llm, LlmSettings::default());
        assert_eq!(config.catalog, CatalogSettings::None);
        assert_eq!(config.enrichment_concurrency, 4);
        assert_eq!(config.rate_limit, RateLimitSettings::default());
        assert_eq!(config.content, ContentSettings::default());
        assert!(config
            .content
            .content_denylist
            .contains(&"nsfw".to_string()));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let file_config = FileConfig {
            port: Some(4000),
            logging_level: Some("body".to_string()),
            frontend_dir_path: Some("/toml/frontend".to_string()),
            ..Default::default()
        };
        let cli = CliConfig {
            frontend_dir_path: Some("/cli/frontend".to_string()),
            ..cli()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.frontend_dir_path.as_deref(), Some("/toml/frontend"));
    }

    #[test]
    fn test_resolve_openai_defaults() {
        let file_config = FileConfig {
            llm: Some(LlmConfig {
                provider: Some("OpenAI".to_string()),
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli(), Some(file_config)).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_resolve_unknown_llm_provider_error() {
        let file_config = FileConfig {
            llm: Some(LlmConfig {
                provider: Some("gemini".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli(), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }

    #[test]
    fn test_resolve_spotify_requires_credentials() {
        let file_config = FileConfig {
            catalog: Some(CatalogConfig {
                provider: Some("spotify".to_string()),
                client_id: Some("id".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli(), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("requires client_id and client_secret"));
    }

    #[test]
    fn test_resolve_spotify() {
        let file_config = FileConfig {
            catalog: Some(CatalogConfig {
                provider: Some("spotify".to_string()),
                client_id: Some("id".to_string()),
                client_secret: Some("secret".to_string()),
                enrichment_concurrency: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli(), Some(file_config)).unwrap();
        assert_eq!(
            config.catalog,
            CatalogSettings::Spotify {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                market: None,
                timeout_secs: 10,
            }
        );
        assert_eq!(config.enrichment_concurrency, 2);
    }

    #[test]
    fn test_resolve_zero_limits_error() {
        let zero_requests = FileConfig {
            rate_limit: Some(RateLimitConfig {
                max_requests: Some(0),
                window_secs: None,
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli(), Some(zero_requests)).is_err());

        let zero_window = FileConfig {
            rate_limit: Some(RateLimitConfig {
                max_requests: None,
                window_secs: Some(0),
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli(), Some(zero_window)).is_err());

        let zero_concurrency = FileConfig {
            catalog: Some(CatalogConfig {
                enrichment_concurrency: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli(), Some(zero_concurrency)).is_err());
    }

    #[test]
    fn test_resolve_huge_window_error() {
        let huge_window = FileConfig {
            rate_limit: Some(RateLimitConfig {
                max_requests: None,
                window_secs: Some(u64::MAX),
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli(), Some(huge_window)).unwrap_err();
        assert!(err.to_string().contains("rate_limit.window_secs must be at most"));

        let longest = FileConfig {
            rate_limit: Some(RateLimitConfig {
                max_requests: None,
                window_secs: Some(MAX_RATE_LIMIT_WINDOW.as_secs()),
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli(), Some(longest)).unwrap();
        assert_eq!(config.rate_limit.window, MAX_RATE_LIMIT_WINDOW);
    }

    #[test]
    fn test_resolve_input_length_must_fit_invalid_marker() {
        let too_short = FileConfig {
            content: Some(ContentConfig {
                max_input_length: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli(), Some(too_short)).unwrap_err();
        assert!(err.to_string().contains("content.max_input_length must be at least 13"));

        let exact = FileConfig {
            content: Some(ContentConfig {
                max_input_length: Some(INVALID_INPUT.len()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli(), Some(exact)).is_ok());
    }

    #[test]
    fn test_resolve_content_lists_are_normalized() {
        let file_config = FileConfig {
            content: Some(ContentConfig {
                content_denylist: Some(vec!["  Banned ".to_string(), "".to_string()]),
                injection_phrases: Some(vec!["Obey Me".to_string()]),
                song_count: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli(), Some(file_config)).unwrap();
        assert_eq!(config.content.content_denylist, vec!["banned".to_string()]);
        assert_eq!(config.content.injection_phrases, vec!["obey me".to_string()]);
        assert_eq!(config.content.song_count, 5);
        assert_eq!(config.content.max_input_length, 250);
    }

    #[test]
    fn test_resolve_missing_personas_file_error() {
        let cli = CliConfig {
            personas_file: Some(PathBuf::from("/nonexistent/personas.toml")),
            ..cli()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Personas file does not exist"));
    }

    #[test]
    fn test_resolve_personas_file_exists() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            personas_file: Some(file.path().to_path_buf()),
            ..cli()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.personas_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_resolve_client_id_header() {
        let file_config = FileConfig {
            server: Some(ServerSectionConfig {
                client_id_header: Some(" X-Session-Id ".to_string()),
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli(), Some(file_config)).unwrap();
        assert_eq!(config.client_id_header.as_deref(), Some("x-session-id"));
    }
}
