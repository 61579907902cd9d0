//! CLI command implementations

use anyhow::Context;
use clap::Subcommand;
use flotilla_core::{FlotillaConfig, RuntimeMode};
use flotilla_search::{MediaKind, ProviderSelection, ProviderStatus, StreamService};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the addon server
    Server {
        /// Host to bind to (overrides FLOTILLA_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides FLOTILLA_PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Runtime mode: production or development (overrides FLOTILLA_MODE)
        #[arg(long, value_enum)]
        mode: Option<RuntimeMode>,
    },
    /// Run one aggregation and print what every provider returned
    Streams {
        /// Content type: movie or series
        media_type: String,
        /// Stremio id, e.g. tt0133093 or tt0944947:1:2
        id: String,
        /// Comma-separated provider names to query
        #[arg(long)]
        providers: Option<String>,
        /// Runtime mode: production or development (overrides FLOTILLA_MODE)
        #[arg(long, value_enum)]
        mode: Option<RuntimeMode>,
    },
    /// List registered providers
    Providers {
        /// Runtime mode: production or development (overrides FLOTILLA_MODE)
        #[arg(long, value_enum)]
        mode: Option<RuntimeMode>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the error of the command that failed, with context
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Server { host, port, mode } => start_server(host, port, mode).await,
        Commands::Streams {
            media_type,
            id,
            providers,
            mode,
        } => lookup_streams(&media_type, &id, providers.as_deref(), mode).await,
        Commands::Providers { mode } => list_providers(mode),
    }
}

fn load_config(mode: Option<RuntimeMode>) -> FlotillaConfig {
    let mut config = FlotillaConfig::from_env();
    if let Some(mode) = mode {
        config.runtime_mode = mode;
    }
    tracing::debug!(
        mode = %config.runtime_mode,
        json_providers = config.providers.json.len(),
        embed_providers = config.providers.embed.len(),
        tmdb_key = config.resolver.tmdb_api_key.is_some(),
        "Loaded configuration"
    );
    config
}

/// Start the addon server
///
/// # Errors
/// - Service construction failed or the listener could not be bound
pub async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    mode: Option<RuntimeMode>,
) -> anyhow::Result<()> {
    let mut config = load_config(mode);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    println!(
        "Starting Flotilla ({}) on http://{}:{}/manifest.json",
        config.runtime_mode, config.server.host, config.server.port
    );

    flotilla_web::run_server(config)
        .await
        .context("Addon server failed")
}

/// Run one aggregation and print candidates and provider status
///
/// # Errors
/// - Unknown content type or malformed id
/// - Service construction failed
pub async fn lookup_streams(
    media_type: &str,
    id: &str,
    providers: Option<&str>,
    mode: Option<RuntimeMode>,
) -> anyhow::Result<()> {
    let config = load_config(mode);
    let service = StreamService::from_config(&config).context("Failed to build stream service")?;

    let kind = media_type
        .parse::<MediaKind>()
        .with_context(|| format!("Invalid content type '{media_type}'"))?;
    let selection = providers.map(ProviderSelection::parse);

    let outcome = service
        .streams(kind, id, selection.as_ref())
        .await
        .with_context(|| format!("Invalid id '{id}'"))?;

    println!("Streams for {kind} {id}");
    println!("{:-<60}", "");
    if outcome.candidates.is_empty() {
        println!("No streams found.");
    }
    for candidate in &outcome.candidates {
        println!(
            "[{}] {} ({})",
            candidate.display_name,
            candidate.title,
            candidate.quality.as_deref().unwrap_or("unknown quality")
        );
        println!("    {}", candidate.url);
    }

    println!();
    println!("Providers");
    println!("{:-<60}", "");
    for (name, status) in &outcome.provider_status {
        match status {
            ProviderStatus::Succeeded { count } => println!("  {name:<24} ok       {count}"),
            ProviderStatus::Failed {
                kind,
                error_summary,
            } => println!("  {name:<24} failed   {kind:?}: {error_summary}"),
        }
    }

    Ok(())
}

/// List registered providers
///
/// # Errors
/// - Service construction failed
pub fn list_providers(mode: Option<RuntimeMode>) -> anyhow::Result<()> {
    let config = load_config(mode);
    let service = StreamService::from_config(&config).context("Failed to build stream service")?;

    println!("Providers ({})", config.runtime_mode);
    println!("{:-<60}", "");
    if service.registry().is_empty() {
        println!("No providers registered.");
        println!("Declare some with FLOTILLA_JSON_PROVIDERS or FLOTILLA_EMBED_PROVIDERS.");
    }
    for name in service.registry().names() {
        println!("  {name}");
    }

    Ok(())
}
