//! Tracing subscriber initialization
//!
//! Logs go to stderr so stdout stays clean for reports.
//!
//! # Priority (highest to lowest)
//!
//! 1. `HCP_LOG` env var (per-target directives, e.g. `hcp_core=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. CLI flags (`-v` → debug, `-q` → error)
//! 4. Default level: `warn`

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding project-specific log directives
pub const LOG_ENV: &str = "HCP_LOG";

/// Verbosity level derived from CLI flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// `--quiet` / `-q`: only errors
    Quiet,
    /// Warnings and above
    #[default]
    Normal,
    /// `--verbose` / `-v`: debug output
    Verbose,
}

impl Verbosity {
    /// Determine verbosity from the parsed flags; verbose wins over quiet
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Default level when no env directives are set
    #[must_use]
    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber
///
/// # Errors
/// Fails if a global subscriber is already set.
pub fn init_subscriber(verbosity: Verbosity, json: bool) -> Result<()> {
    let filter = build_env_filter(
        verbosity,
        std::env::var(LOG_ENV).ok().as_deref(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
    );
    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(stderr_is_tty)
                    .with_target(verbosity == Verbosity::Verbose)
                    .without_time()
                    .compact(),
            )
            .try_init()
    };

    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// `HCP_LOG` > `RUST_LOG` > CLI verbosity; unparseable directives fall through
fn build_env_filter(verbosity: Verbosity, hcp_log: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    for directives in [hcp_log, rust_log].into_iter().flatten() {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }

    let level = verbosity.default_level();
    let directive = if verbosity == Verbosity::Verbose {
        format!("{level},hcp_core=debug,hcp_cli=debug")
    } else {
        level.to_string()
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins_over_quiet() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn default_levels() {
        assert_eq!(Verbosity::Quiet.default_level(), Level::ERROR);
        assert_eq!(Verbosity::Normal.default_level(), Level::WARN);
        assert_eq!(Verbosity::Verbose.default_level(), Level::DEBUG);
    }

    #[test]
    fn hcp_log_takes_priority() {
        let filter = build_env_filter(Verbosity::Quiet, Some("hcp_core=trace"), Some("info"));
        assert_eq!(filter.to_string().to_lowercase(), "hcp_core=trace");
    }

    #[test]
    fn rust_log_is_fallback() {
        let filter = build_env_filter(Verbosity::Normal, None, Some("info"));
        assert_eq!(filter.to_string().to_lowercase(), "info");
    }

    #[test]
    fn flags_apply_without_env() {
        let filter = build_env_filter(Verbosity::Quiet, None, None);
        assert_eq!(filter.to_string().to_lowercase(), "error");

        let verbose = build_env_filter(Verbosity::Verbose, None, None)
            .to_string()
            .to_lowercase();
        assert!(verbose.contains("hcp_core=debug"), "{verbose}");
    }
}
