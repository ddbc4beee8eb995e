//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CMS_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_LANDING_SLUG: &str = "home";
const DEFAULT_CMS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RESET_DELAY_SECS: u64 = 5;

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "folio landing page server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the folio HTTP server.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the CMS base URL.
    #[arg(long = "cms-base-url", value_name = "URL")]
    pub cms_base_url: Option<String>,

    /// Override the CMS API token.
    #[arg(long = "cms-api-token", env = "FOLIO_CMS_API_TOKEN", value_name = "TOKEN")]
    pub cms_api_token: Option<String>,

    /// Override the slug served as the landing page.
    #[arg(long = "landing-slug", value_name = "SLUG")]
    pub landing_slug: Option<String>,

    /// Override the CMS request timeout.
    #[arg(long = "cms-timeout-seconds", value_name = "SECONDS")]
    pub cms_timeout_seconds: Option<u64>,

    /// Override the delay before a successful submission resets to idle.
    #[arg(long = "submission-reset-seconds", value_name = "SECONDS")]
    pub submission_reset_seconds: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cms: CmsSettings,
    pub submission: SubmissionSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub landing_slug: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub reset_delay: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cms: RawCmsSettings,
    submission: RawSubmissionSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCmsSettings {
    base_url: Option<String>,
    api_token: Option<String>,
    landing_slug: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSubmissionSettings {
    reset_delay_seconds: Option<u64>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.cms_base_url.as_ref() {
            self.cms.base_url = Some(url.clone());
        }
        if let Some(token) = overrides.cms_api_token.as_ref() {
            self.cms.api_token = Some(token.clone());
        }
        if let Some(slug) = overrides.landing_slug.as_ref() {
            self.cms.landing_slug = Some(slug.clone());
        }
        if let Some(seconds) = overrides.cms_timeout_seconds {
            self.cms.request_timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.submission_reset_seconds {
            self.submission.reset_delay_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cms,
            submission,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cms: build_cms_settings(cms)?,
            submission: build_submission_settings(submission)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cms_settings(cms: RawCmsSettings) -> Result<CmsSettings, LoadError> {
    let base_url = cms
        .base_url
        .unwrap_or_else(|| DEFAULT_CMS_BASE_URL.to_string());
    let base_url = Url::parse(base_url.trim())
        .map_err(|err| LoadError::invalid("cms.base_url", format!("failed to parse: {err}")))?;

    let api_token = cms.api_token.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let landing_slug = cms
        .landing_slug
        .unwrap_or_else(|| DEFAULT_LANDING_SLUG.to_string());
    if landing_slug.trim().is_empty() {
        return Err(LoadError::invalid("cms.landing_slug", "must not be empty"));
    }
    if landing_slug.contains('/') || landing_slug.contains(' ') {
        return Err(LoadError::invalid(
            "cms.landing_slug",
            "must not contain `/` or spaces",
        ));
    }

    let timeout_secs = cms
        .request_timeout_seconds
        .unwrap_or(DEFAULT_CMS_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "cms.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CmsSettings {
        base_url,
        api_token,
        landing_slug,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_submission_settings(
    submission: RawSubmissionSettings,
) -> Result<SubmissionSettings, LoadError> {
    let reset_secs = submission
        .reset_delay_seconds
        .unwrap_or(DEFAULT_RESET_DELAY_SECS);
    if reset_secs == 0 {
        return Err(LoadError::invalid(
            "submission.reset_delay_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SubmissionSettings {
        reset_delay: Duration::from_secs(reset_secs),
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    format!("{host}:{port}")
        .parse()
        .map_err(|err| format!("failed to parse `{host}:{port}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn reset_delay_defaults_to_five_seconds() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.submission.reset_delay, Duration::from_secs(5));
    }

    #[test]
    fn reset_delay_can_be_overridden_via_cli() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            submission_reset_seconds: Some(12),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.submission.reset_delay, Duration::from_secs(12));
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn landing_slug_rejects_path_separators() {
        let mut raw = RawSettings::default();
        raw.cms.landing_slug = Some("pages/home".to_string());

        let err = Settings::from_raw(raw).expect_err("invalid slug");
        assert!(matches!(err, LoadError::Invalid { key, .. } if key == "cms.landing_slug"));
    }

    #[test]
    fn cms_base_url_must_parse() {
        let mut raw = RawSettings::default();
        raw.cms.base_url = Some("not a url".to_string());

        let err = Settings::from_raw(raw).expect_err("invalid url");
        assert!(matches!(err, LoadError::Invalid { key, .. } if key == "cms.base_url"));
    }

    #[test]
    fn blank_api_token_is_treated_as_absent() {
        let mut raw = RawSettings::default();
        raw.cms.api_token = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.cms.api_token, None);
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["folio"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }
}
