//! Logging initialization for the `tilepack` command line tool.
//!
//! Output is controlled by an [`EnvFilter`] string and a [`LogFormat`].

use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

pub mod progress;

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, single-line logs.
    Full,

    /// A variant of the full format, optimized for short line lengths.
    Compact,

    /// Compact logs without timestamps, targets or ANSI colors.
    Bare,

    /// Multi-line logs for local development.
    Pretty,

    /// Newline-delimited JSON logs.
    Json,
}

impl LogFormat {
    /// Installs the global subscriber for this format.
    pub fn init(self, env_filter: EnvFilter) {
        let dispatch = match self {
            LogFormat::Full => tracing_subscriber::fmt()
                .with_span_events(FmtSpan::NONE)
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish()
                .into(),
            LogFormat::Compact => tracing_subscriber::fmt()
                .compact()
                .with_span_events(FmtSpan::NONE)
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish()
                .into(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish()
                .into(),
            LogFormat::Bare => tracing_subscriber::fmt()
                .compact()
                .with_span_events(FmtSpan::NONE)
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish()
                .into(),
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish()
                .into(),
        };
        if let Err(e) = tracing::dispatcher::set_global_default(dispatch) {
            eprintln!("Warning: unable to set the global log subscriber: {e}");
        }
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" | "verbose" => Ok(Self::Pretty),
            "bare" => Ok(Self::Bare),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: json, full, compact, bare or pretty"
            )),
        }
    }
}

/// Initialize the global tracing subscriber for the given filter and format.
///
/// Invalid values are reported on stderr: a bad filter falls back to `debug`,
/// a bad format to [`LogFormat::default`].
pub fn init_tracing(filter: &str, format: Option<String>) {
    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!("Warning: Invalid filter string '{filter}' passed, falling back to debug");
        EnvFilter::new("debug")
    });

    let log_format = format
        .and_then(|s| {
            s.parse::<LogFormat>()
                .map_err(|e| {
                    eprintln!("Warning: {e}");
                    eprintln!(
                        "Falling back to default format ({:?})",
                        LogFormat::default()
                    );
                })
                .ok()
        })
        .unwrap_or_default();

    log_format.init(env_filter);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("full", LogFormat::Full)]
    #[case("COMPACT", LogFormat::Compact)]
    #[case("verbose", LogFormat::Pretty)]
    #[case("bare", LogFormat::Bare)]
    #[case("jsonl", LogFormat::Json)]
    fn parse_format(#[case] value: &str, #[case] expected: LogFormat) {
        assert_eq!(value.parse::<LogFormat>(), Ok(expected));
    }

    #[test]
    fn unknown_format() {
        assert!("xml".parse::<LogFormat>().unwrap_err().contains("'xml'"));
    }
}
