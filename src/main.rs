use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use diddymeter_server::blacklist::{BlacklistSource, FileBlacklistSource, StaticBlacklistSource};
use diddymeter_server::cache_store::{CacheStore, InMemoryCacheStore, SqliteCacheStore};
use diddymeter_server::config::{AppConfig, CliConfig, FileConfig};
use diddymeter_server::gateway::{CacheGateway, RequestThrottle};
use diddymeter_server::musicbrainz::{MusicBrainzClient, MusicBrainzResolver};
use diddymeter_server::pipeline::TrackPipeline;
use diddymeter_server::server::{self, run_server, RequestsLoggingLevel, ServerState};
use diddymeter_server::spotify::SpotifyClient;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Could not read the working directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in it override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite lookup cache. The cache is kept in memory when omitted.
    #[clap(long, value_parser = parse_path)]
    pub cache_db: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// TOML file with blacklist entries and role weights. Re-read on every request.
    #[clap(long, value_parser = parse_path)]
    pub blacklist_file: Option<PathBuf>,

    /// User-Agent sent to MusicBrainz, which asks for contact details in it.
    #[clap(long)]
    pub musicbrainz_user_agent: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            cache_db: args.cache_db.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            blacklist_file: args.blacklist_file.clone(),
            musicbrainz_user_agent: args.musicbrainz_user_agent.clone(),
            spotify_client_id: args.spotify_client_id.clone(),
            spotify_client_secret: args.spotify_client_secret.clone(),
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
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let cache_store: Arc<dyn CacheStore> = match &app_config.cache_db {
        Some(path) => {
            info!("Opening SQLite cache database at {:?}...", path);
            Arc::new(SqliteCacheStore::new(path)?)
        }
        None => {
            info!("No cache database configured, caching in memory");
            Arc::new(InMemoryCacheStore::new())
        }
    };

    let throttle_settings = &app_config.throttle;
    info!(
        "MusicBrainz throttle: enabled={}, {} concurrent, {:?} spacing, {} calls per {:?}",
        throttle_settings.enabled,
        throttle_settings.max_concurrent,
        throttle_settings.min_interval,
        throttle_settings.quota,
        throttle_settings.window
    );
    let throttle = Arc::new(RequestThrottle::new(throttle_settings.clone()));
    let gateway = Arc::new(CacheGateway::new(cache_store, throttle));

    let blacklist: Arc<dyn BlacklistSource> = match &app_config.blacklist_file {
        Some(path) => {
            info!("Using blacklist file {:?}", path);
            let source = FileBlacklistSource::new(path);
            source
                .load()
                .with_context(|| format!("Blacklist file {:?} is not valid", path))?;
            Arc::new(source)
        }
        None => {
            info!("Using built-in blacklist");
            Arc::new(StaticBlacklistSource::default())
        }
    };

    let spotify = SpotifyClient::new(app_config.spotify.clone())?;
    let musicbrainz = MusicBrainzClient::new(
        app_config.musicbrainz.clone(),
        app_config.retry.clone(),
        gateway.clone(),
    )?;
    let resolver = MusicBrainzResolver::new(musicbrainz, gateway.clone());

    let pipeline = Arc::new(TrackPipeline::new(
        Arc::new(spotify),
        Arc::new(resolver),
        blacklist.clone(),
        app_config.pipeline.clone(),
    ));

    let server_config = app_config.server_config();
    let state = ServerState::new(server_config.clone(), pipeline, gateway, blacklist);

    run_server(server_config, state).await
}
