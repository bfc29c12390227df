//! Tracing subscriber setup.
//!
//! Logs go to stderr so the synth summary on stdout can be piped on its own.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format selected by `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `None` for values other than json, pretty, compact or text.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "compact" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `log_level`.
///
/// An unknown `log_format` falls back to pretty output and is reported once
/// the subscriber is up.
pub fn init(log_format: &str, log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let parsed = LogFormat::parse(log_format);
    let format = parsed.unwrap_or(LogFormat::Pretty);

    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });
    let pretty = (format == LogFormat::Pretty)
        .then(|| fmt::layer().compact().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();

    if parsed.is_none() {
        tracing::warn!(
            log_format,
            "Unknown log format, using pretty. Valid options: json, pretty"
        );
    }
    tracing::debug!(log_format = format.as_str(), log_level, "Logging initialized");
}
