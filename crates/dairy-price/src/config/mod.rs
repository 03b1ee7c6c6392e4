use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub artifacts: ArtifactConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let artifacts = ArtifactConfig {
            model_path: PathBuf::from(var_or(
                "APP_MODEL_PATH",
                ArtifactConfig::DEFAULT_MODEL_PATH,
            )),
            scaler_path: PathBuf::from(var_or(
                "APP_SCALER_PATH",
                ArtifactConfig::DEFAULT_SCALER_PATH,
            )),
        };

        let utc_offset = parse_utc_offset(&var_or("APP_REPORT_UTC_OFFSET", "+05:30"))?;
        let numbering = parse_flag(
            "APP_REPORT_NUMBERING",
            &var_or("APP_REPORT_NUMBERING", "true"),
        )?;

        let report = ReportConfig {
            org_code: var_or("APP_REPORT_ORG_CODE", ReportConfig::DEFAULT_ORG_CODE),
            region_code: var_or("APP_REPORT_REGION_CODE", ReportConfig::DEFAULT_REGION_CODE),
            org_name: var_or("APP_REPORT_ORG_NAME", ReportConfig::DEFAULT_ORG_NAME),
            utc_offset,
            numbering,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            artifacts,
            report,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key }),
    }
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let invalid = || ConfigError::InvalidUtcOffset {
        value: raw.to_string(),
    };

    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the pre-fitted scaler and regression model.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

impl ArtifactConfig {
    pub const DEFAULT_MODEL_PATH: &'static str = "artifacts/model.json";
    pub const DEFAULT_SCALER_PATH: &'static str = "artifacts/scaler.csv";
}

/// Report metadata: numbering prefix, organization wording and the reporting timezone.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub org_code: String,
    pub region_code: String,
    pub org_name: String,
    pub utc_offset: FixedOffset,
    pub numbering: bool,
}

impl ReportConfig {
    pub const DEFAULT_ORG_CODE: &'static str = "JKVDA";
    pub const DEFAULT_REGION_CODE: &'static str = "KMR";
    pub const DEFAULT_ORG_NAME: &'static str =
        "Jammu & Kashmir Veterinary Doctors Association-Kashmir";
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            org_code: Self::DEFAULT_ORG_CODE.to_string(),
            region_code: Self::DEFAULT_REGION_CODE.to_string(),
            org_name: Self::DEFAULT_ORG_NAME.to_string(),
            utc_offset: FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or_else(|| Utc.fix()),
            numbering: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUtcOffset { value: String },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUtcOffset { value } => write!(
                f,
                "APP_REPORT_UTC_OFFSET must look like +HH:MM or -HH:MM (got '{value}')"
            ),
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidUtcOffset { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
