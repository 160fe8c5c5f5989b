//! Subscriber setup shared by `nerdmath-backend` and the `nerdmath` CLI.

use std::env;
use std::str::FromStr;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Directive used when `RUST_LOG` is unset. The database drivers are chatty
/// at info level.
pub const DEFAULT_DIRECTIVES: &str = "info,mongodb=warn,neo4rs=warn,hyper=warn,reqwest=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name: String,
    /// `ENV_MODE`, shown in the startup line.
    pub environment: String,
    pub format: LogFormat,
    /// `EnvFilter` directives.
    pub level: String,
    pub log_spans: bool,
    pub include_location: bool,
    /// Keep stdout free for command output.
    pub to_stderr: bool,
}

fn flag(key: &str) -> bool {
    env::var(key).map(|v| v == "true" || v == "1").unwrap_or(false)
}

impl TracingConfig {
    /// Read `LOG_FORMAT`, `RUST_LOG`, `LOG_SPANS`, `LOG_LOCATION` and `ENV_MODE`.
    pub fn for_service(service_name: impl Into<String>) -> Self {
        let format = env::var("LOG_FORMAT")
            .ok()
            .and_then(|f| f.parse().ok())
            .unwrap_or_default();
        Self {
            service_name: service_name.into(),
            environment: env::var("ENV_MODE")
                .or_else(|_| env::var("ENVIRONMENT"))
                .unwrap_or_else(|_| "development".to_string()),
            format,
            level: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_DIRECTIVES.to_string()),
            log_spans: flag("LOG_SPANS"),
            include_location: flag("LOG_LOCATION"),
            to_stderr: false,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn to_stderr(mut self) -> Self {
        self.to_stderr = true;
        self
    }
}

/// Install the global subscriber.
///
/// Returns `false` when one is already installed (several tests in one
/// process, or a second call).
pub fn init_tracing(config: TracingConfig) -> bool {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let spans = if config.log_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let writer = || {
        if config.to_stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        }
    };
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(spans)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(writer()),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_span_events(spans)
                    .with_writer(writer()),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(spans)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(writer()),
            )
            .try_init(),
    }
    .is_ok();

    if installed {
        tracing::debug!(
            service = %config.service_name,
            environment = %config.environment,
            format = ?config.format,
            "Tracing initialized"
        );
    }
    installed
}
