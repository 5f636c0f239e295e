use anyhow::{bail, Context, Result};
use std::env;
use url::Url;

use crate::activities::metrics::NumberLocale;
use crate::api::pagination::PAGE_SIZE_OPTIONS;
use crate::logging::LogFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub log_format: LogFormat,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // ActivityService (source of the activity records)
    pub activity_service_url: Url,
    pub activity_service_timeout_seconds: u64,
    pub activity_service_max_retry_seconds: u64,

    // Export service (PDF/Excel rendering)
    pub export_service_url: Url,
    pub export_service_timeout_seconds: u64,

    // Table defaults
    pub default_page_size: usize,
    pub number_locale: NumberLocale,
    pub max_view_sessions: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let log_format = LogFormat::resolve(env::var("LOG_FORMAT").ok().as_deref(), &env);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // ActivityService
        let activity_service_url = parse_url(
            &env::var("ACTIVITY_SERVICE_URL").context("ACTIVITY_SERVICE_URL must be set")?,
            "ACTIVITY_SERVICE_URL",
        )?;
        let activity_service_timeout_seconds = parse_or("ACTIVITY_SERVICE_TIMEOUT_SECONDS", 30);
        let activity_service_max_retry_seconds =
            parse_or("ACTIVITY_SERVICE_MAX_RETRY_SECONDS", 10);

        // Export service
        let export_service_url = parse_url(
            &env::var("EXPORT_SERVICE_URL").context("EXPORT_SERVICE_URL must be set")?,
            "EXPORT_SERVICE_URL",
        )?;
        let export_service_timeout_seconds = parse_or("EXPORT_SERVICE_TIMEOUT_SECONDS", 120);

        // Table defaults
        let default_page_size = parse_or("DEFAULT_PAGE_SIZE", 25);
        if !PAGE_SIZE_OPTIONS.contains(&default_page_size) {
            bail!(
                "DEFAULT_PAGE_SIZE must be one of {:?}, got {}",
                PAGE_SIZE_OPTIONS,
                default_page_size
            );
        }
        let number_locale = match env::var("NUMBER_LOCALE") {
            Ok(tag) => NumberLocale::from_tag(&tag)
                .with_context(|| format!("Unsupported NUMBER_LOCALE '{}'", tag))?,
            Err(_) => NumberLocale::default(),
        };
        let max_view_sessions = parse_or("MAX_VIEW_SESSIONS", 1000);

        Ok(Settings {
            env,
            server_addr,
            log_format,
            cors_allow_origins,
            activity_service_url,
            activity_service_timeout_seconds,
            activity_service_max_retry_seconds,
            export_service_url,
            export_service_timeout_seconds,
            default_page_size,
            number_locale,
            max_view_sessions,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Base URLs are joined with relative paths, so they must end with `/`.
pub fn parse_url(raw: &str, key: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("{} is not a valid URL", key))
}
