//! Tracing subscriber setup

use crate::config::{Environment, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Explicit `LOG_FORMAT` wins; otherwise JSON in prod, pretty elsewhere.
    pub fn resolve(explicit: Option<&str>, env: &Environment) -> Self {
        match explicit.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            Some("pretty") => Self::Pretty,
            _ if matches!(env, Environment::Prod) => Self::Json,
            _ => Self::Pretty,
        }
    }
}

fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "obras_atividades=debug,tower_http=debug,info",
        Environment::Staging => "obras_atividades=debug,tower_http=info,info",
        Environment::Prod => "obras_atividades=info,tower_http=info,warn",
    }
}

pub fn init_logging(settings: &Settings) {
    let env = &settings.env;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    let registry = tracing_subscriber::registry().with(filter);
    match settings.log_format {
        LogFormat::Json => registry.with(fmt_layer.json()).init(),
        LogFormat::Compact => registry.with(fmt_layer.compact()).init(),
        LogFormat::Pretty => registry.with(fmt_layer.pretty()).init(),
    }

    tracing::info!(
        env = ?env,
        format = ?settings.log_format,
        "Logging initialized"
    );
}
