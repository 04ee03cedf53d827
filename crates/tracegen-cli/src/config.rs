//! Output settings resolved from the global flags

use crate::commands::{Cli, ColorArg};
use std::io::IsTerminal;

/// How much the CLI prints and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only, no progress bar
    Quiet,
    #[default]
    Normal,
    /// `-v`: pipeline stages
    Verbose,
    /// `-vv` and up: per-path and per-file detail
    Debug,
}

impl Verbosity {
    /// Level for `-v` given `count` times; `-q` wins.
    #[must_use]
    pub const fn from_flags(count: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match count {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "tracegen=info,warn",
            Self::Debug => "tracegen=debug,info",
        }
    }

    /// Whether log lines carry their module target.
    #[must_use]
    pub const fn shows_targets(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }
}

/// Settings every command handler receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CliConfig {
    pub verbosity: Verbosity,
    /// `--color`, with `auto` already resolved against stderr
    pub use_color: bool,
}

impl CliConfig {
    /// Resolve the global flags of `cli`.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let use_color = match cli.color {
            ColorArg::Always => true,
            ColorArg::Never => false,
            ColorArg::Auto => std::io::stderr().is_terminal(),
        };
        Self {
            verbosity: Verbosity::from_flags(cli.verbose, cli.quiet),
            use_color,
        }
    }

    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        matches!(self.verbosity, Verbosity::Quiet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(3, false), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
    }

    #[test]
    fn test_log_directive_scopes_to_tracegen() {
        assert_eq!(Verbosity::Quiet.log_directive(), "error");
        assert!(Verbosity::Debug.log_directive().starts_with("tracegen=debug"));
        assert!(!Verbosity::Normal.shows_targets());
    }

    #[test]
    fn test_from_cli() {
        let cli = Cli::parse_from(["tracegen", "-vv", "--color", "always", "verify"]);
        let config = CliConfig::from_cli(&cli);
        assert_eq!(config.verbosity, Verbosity::Debug);
        assert!(config.use_color);

        let cli = Cli::parse_from(["tracegen", "-q", "-v", "--color", "never", "verify"]);
        let config = CliConfig::from_cli(&cli);
        assert!(config.is_quiet());
        assert!(!config.use_color);
    }
}
