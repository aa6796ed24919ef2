use anyhow::{Context, Result};
use clap::Parser;
use moodmix_server::catalog_search::create_catalog_search;
use moodmix_server::config::{AppConfig, CliConfig, FileConfig};
use moodmix_server::llm::create_provider;
use moodmix_server::persona::PersonaStore;
use moodmix_server::recommendation::{
    InMemoryRateLimiter, PipelineSettings, RecommendationService,
};
use moodmix_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in it override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// TOML persona table replacing the built-in one.
    #[clap(long, value_parser = parse_path)]
    pub personas_file: Option<PathBuf>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            port: args.port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            personas_file: args.personas_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    let personas = Arc::new(PersonaStore::load_or_builtin(config.personas_file.as_deref())?);
    info!("{} personas available", personas.len());

    let llm = create_provider(&config.llm)?;
    info!(
        "Using LLM provider {} with model {} at {}",
        llm.name(),
        llm.model(),
        config.llm.base_url
    );
    if let Err(e) = llm.health_check().await {
        warn!("LLM provider is not reachable yet: {}", e);
    }

    let catalog = create_catalog_search(&config.catalog)?;
    info!(
        "Catalog enrichment via {} (concurrency {})",
        catalog.name(),
        config.enrichment_concurrency
    );

    let rate_limiter = Arc::new(InMemoryRateLimiter::new(
        config.rate_limit.max_requests,
        config.rate_limit.window,
    ));
    info!(
        "Rate limit: {} requests per {}s per client",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );

    let service = Arc::new(RecommendationService::new(
        llm,
        catalog,
        rate_limiter,
        personas.clone(),
        PipelineSettings::from_config(&config),
    ));

    info!("Ready to serve at port {}!", config.port);
    run_server(ServerConfig::from(&config), service, personas).await
}
