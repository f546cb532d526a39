mod file_config;

pub use file_config::{
    FileConfig, MusicBrainzFileConfig, PipelineConfig, RetryConfig, SpotifyConfig, ThrottleConfig,
};

use crate::gateway::ThrottleSettings;
use crate::musicbrainz::{MusicBrainzConfig, RetryPolicy};
use crate::pipeline::PipelineSettings;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use crate::spotify::SpotifyClientConfig;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub cache_db: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub blacklist_file: Option<PathBuf>,
    pub musicbrainz_user_agent: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    /// SQLite cache location. `None` keeps the cache in memory.
    pub cache_db: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// TOML blacklist. `None` uses the built-in list.
    pub blacklist_file: Option<PathBuf>,

    // Upstream services
    pub spotify: SpotifyClientConfig,
    pub musicbrainz: MusicBrainzConfig,

    // Tuning (with defaults)
    pub throttle: ThrottleSettings,
    pub retry: RetryPolicy,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let cache_db = file
            .cache_db
            .map(PathBuf::from)
            .or_else(|| cli.cache_db.clone());
        if let Some(parent) = cache_db.as_ref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Cache database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let blacklist_file = file
            .blacklist_file
            .map(PathBuf::from)
            .or_else(|| cli.blacklist_file.clone());

        let spotify = resolve_spotify(cli, file.spotify.unwrap_or_default())?;
        let musicbrainz = resolve_musicbrainz(cli, file.musicbrainz.unwrap_or_default());
        let throttle = resolve_throttle(file.throttle.unwrap_or_default())?;
        let retry = resolve_retry(file.retry.unwrap_or_default())?;

        let pipeline_file = file.pipeline.unwrap_or_default();
        let pipeline = PipelineSettings {
            max_page_size: pipeline_file
                .max_page_size
                .unwrap_or(PipelineSettings::default().max_page_size),
        };
        if pipeline.max_page_size == 0 {
            bail!("pipeline.max_page_size must be at least 1");
        }

        Ok(AppConfig {
            cache_db,
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            blacklist_file,
            spotify,
            musicbrainz,
            throttle,
            retry,
            pipeline,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            frontend_dir_path: self.frontend_dir_path.clone(),
        }
    }
}

fn resolve_spotify(cli: &CliConfig, file: SpotifyConfig) -> Result<SpotifyClientConfig> {
    let client_id = file.client_id.or_else(|| cli.spotify_client_id.clone());
    let client_secret = file
        .client_secret
        .or_else(|| cli.spotify_client_secret.clone());
    let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
        bail!(
            "Spotify credentials must be specified via --spotify-client-id/--spotify-client-secret, \
             SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET or the [spotify] config section"
        );
    };

    let defaults = SpotifyClientConfig::new(client_id, client_secret);
    Ok(SpotifyClientConfig {
        api_base_url: file.api_base_url.unwrap_or(defaults.api_base_url.clone()),
        accounts_base_url: file
            .accounts_base_url
            .unwrap_or(defaults.accounts_base_url.clone()),
        timeout_sec: file.timeout_sec.unwrap_or(defaults.timeout_sec),
        ..defaults
    })
}

fn resolve_musicbrainz(cli: &CliConfig, file: MusicBrainzFileConfig) -> MusicBrainzConfig {
    let defaults = MusicBrainzConfig::default();
    MusicBrainzConfig {
        base_url: file.base_url.unwrap_or(defaults.base_url),
        user_agent: file
            .user_agent
            .or_else(|| cli.musicbrainz_user_agent.clone())
            .unwrap_or(defaults.user_agent),
        timeout_sec: file.timeout_sec.unwrap_or(defaults.timeout_sec),
    }
}

fn resolve_throttle(file: ThrottleConfig) -> Result<ThrottleSettings> {
    let defaults = ThrottleSettings::default();
    let settings = ThrottleSettings {
        enabled: file.enabled.unwrap_or(defaults.enabled),
        max_concurrent: file.max_concurrent.unwrap_or(defaults.max_concurrent),
        min_interval: file
            .min_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.min_interval),
        quota: file.quota.unwrap_or(defaults.quota),
        window: file
            .window_sec
            .map(Duration::from_secs)
            .unwrap_or(defaults.window),
    };
    if settings.max_concurrent == 0 {
        bail!("throttle.max_concurrent must be at least 1");
    }
    if settings.quota == 0 {
        bail!("throttle.quota must be at least 1");
    }
    if settings.window.is_zero() {
        bail!("throttle.window_sec must be at least 1");
    }
    Ok(settings)
}

fn resolve_retry(file: RetryConfig) -> Result<RetryPolicy> {
    let defaults = RetryPolicy::default();
    let policy = RetryPolicy {
        max_attempts: file.max_attempts.unwrap_or(defaults.max_attempts),
        initial_backoff: file
            .initial_backoff_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.initial_backoff),
        max_backoff: file
            .max_backoff_sec
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_backoff),
        backoff_multiplier: file.backoff_multiplier.unwrap_or(defaults.backoff_multiplier),
    };
    if policy.max_attempts == 0 {
        bail!("retry.max_attempts must be at least 1");
    }
    if !policy.backoff_multiplier.is_finite() || policy.backoff_multiplier < 1.0 {
        bail!("retry.backoff_multiplier must be a finite number of at least 1.0");
    }
    Ok(policy)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_credentials() -> CliConfig {
        CliConfig {
            port: 3001,
            metrics_port: 9091,
            spotify_client_id: Some("cli-id".to_string()),
            spotify_client_secret: Some("cli-secret".to_string()),
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
        // Case insensitive
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        // Invalid
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let cli = CliConfig {
            cache_db: Some(temp_dir.path().join("cache.db")),
            logging_level: RequestsLoggingLevel::Headers,
            frontend_dir_path: Some("/frontend".to_string()),
            blacklist_file: Some(PathBuf::from("/etc/blacklist.toml")),
            musicbrainz_user_agent: Some("tester/1.0 (me@example.com)".to_string()),
            ..cli_with_credentials()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.cache_db, Some(temp_dir.path().join("cache.db")));
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.frontend_dir_path, Some("/frontend".to_string()));
        assert_eq!(
            config.blacklist_file,
            Some(PathBuf::from("/etc/blacklist.toml"))
        );
        assert_eq!(config.spotify.client_id, "cli-id");
        assert_eq!(config.spotify.api_base_url, "https://api.spotify.com/v1");
        assert_eq!(config.musicbrainz.user_agent, "tester/1.0 (me@example.com)");
        assert_eq!(config.throttle, ThrottleSettings::default());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.pipeline.max_page_size, 50);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let cli = CliConfig {
            logging_level: RequestsLoggingLevel::Path,
            ..cli_with_credentials()
        };

        let file_config = FileConfig {
            port: Some(4000),
            logging_level: Some("body".to_string()),
            spotify: Some(SpotifyConfig {
                client_secret: Some("toml-secret".to_string()),
                ..Default::default()
            }),
            throttle: Some(ThrottleConfig {
                quota: Some(30),
                min_interval_ms: Some(250),
                ..Default::default()
            }),
            retry: Some(RetryConfig {
                max_attempts: Some(5),
                ..Default::default()
            }),
            pipeline: Some(PipelineConfig {
                max_page_size: Some(25),
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.spotify.client_secret, "toml-secret");
        assert_eq!(config.throttle.quota, 30);
        assert_eq!(config.throttle.min_interval, Duration::from_millis(250));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.pipeline.max_page_size, 25);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.spotify.client_id, "cli-id");
        assert_eq!(config.throttle.window, Duration::from_secs(60));
        assert!(config.cache_db.is_none());
    }

    #[test]
    fn test_resolve_missing_spotify_credentials_error() {
        let cli = CliConfig {
            spotify_client_secret: None,
            ..cli_with_credentials()
        };

        let err = AppConfig::resolve(&cli, None).unwrap_err();

        assert!(err.to_string().contains("Spotify credentials"));
    }

    #[test]
    fn test_resolve_nonexistent_cache_dir_error() {
        let cli = CliConfig {
            cache_db: Some(PathBuf::from("/nonexistent/path/that/should/not/exist/cache.db")),
            ..cli_with_credentials()
        };

        let err = AppConfig::resolve(&cli, None).unwrap_err();

        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_rejects_invalid_tuning() {
        let zero_quota = FileConfig {
            throttle: Some(ThrottleConfig {
                quota: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_credentials(), Some(zero_quota)).is_err());

        let no_attempts = FileConfig {
            retry: Some(RetryConfig {
                max_attempts: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_credentials(), Some(no_attempts)).is_err());

        for multiplier in [f64::NAN, f64::INFINITY, 0.5] {
            let bad_multiplier = FileConfig {
                retry: Some(RetryConfig {
                    backoff_multiplier: Some(multiplier),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(AppConfig::resolve(&cli_with_credentials(), Some(bad_multiplier)).is_err());
        }

        let same_ports = FileConfig {
            metrics_port: Some(3001),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_credentials(), Some(same_ports)).is_err());
    }

    #[test]
    fn test_server_config() {
        let config = AppConfig::resolve(&cli_with_credentials(), None).unwrap();

        let server = config.server_config();

        assert_eq!(server.port, 3001);
        assert_eq!(server.metrics_port, 9091);
        assert_eq!(server.requests_logging_level, RequestsLoggingLevel::Path);
    }
}
