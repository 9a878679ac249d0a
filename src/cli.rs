// src/cli.rs

//! Execution flags using `clap`.
//!
//! The compiler front end owns the command line; it flattens [`ExecArgs`]
//! into its own parser (`#[command(flatten)]`) and calls
//! [`ExecArgs::load`], or [`ExecArgs::apply`] on a configuration it built
//! itself.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{default_config_path, load_and_validate, ExecConfig};
use crate::errors::Result;
use crate::types::MissingInputPolicy;

/// Flags controlling how the task graph is executed.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "builddag",
    version,
    about = "Execute compilation tasks in dependency order.",
    long_about = None
)]
pub struct ExecArgs {
    /// Path to an execution config file (TOML).
    ///
    /// Defaults to `Builddag.toml` in the current directory when present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of tasks run concurrently.
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Execute every task even if its outputs are up to date.
    #[arg(short = 'F', long)]
    pub force: bool,

    /// Keep starting independent tasks after a failure.
    #[arg(short = 'k', long)]
    pub keep_going: bool,

    /// Treat missing input files as errors instead of warnings.
    #[arg(long)]
    pub strict_inputs: bool,

    /// Directory where generated files are written.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl ExecArgs {
    /// Load the config file (explicit, else the default one if it exists,
    /// else built-in defaults) and overlay the flags.
    pub fn load(&self) -> Result<ExecConfig> {
        let config = match self.config {
            Some(ref path) => load_and_validate(path)?,
            None => {
                let path = default_config_path();
                if path.is_file() {
                    load_and_validate(&path)?
                } else {
                    ExecConfig::default()
                }
            }
        };
        Ok(self.apply(config))
    }

    /// Overlay the flags that were given on top of `config`.
    pub fn apply(&self, mut config: ExecConfig) -> ExecConfig {
        if let Some(jobs) = self.jobs {
            config = config.with_parallelism(usize::from(jobs));
        }
        if self.force {
            config.force = true;
        }
        if self.keep_going {
            config.keep_going = true;
        }
        if self.strict_inputs {
            config.missing_inputs = MissingInputPolicy::Error;
        }
        if let Some(ref dir) = self.out_dir {
            config.output_dir = dir.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = ExecArgs::try_parse_from(["builddag", "-j", "4", "--force", "--strict-inputs"])
            .unwrap();
        let cfg = args.apply(ExecConfig::default().with_keep_going(true));
        assert_eq!(cfg.parallelism, 4);
        assert!(cfg.force);
        assert!(cfg.keep_going);
        assert_eq!(cfg.missing_inputs, MissingInputPolicy::Error);
    }

    #[test]
    fn load_reads_the_config_file_then_applies_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("exec.toml");
        std::fs::write(&path, "[exec]\njobs = 3\nkeep_going = true\noutput_dir = \"gen\"\n").unwrap();

        let path_arg = path.to_str().unwrap();
        let args = ExecArgs::try_parse_from(["builddag", "--config", path_arg, "-j", "8"]).unwrap();
        let cfg = args.load().unwrap();

        assert_eq!(cfg.parallelism, 8);
        assert!(cfg.keep_going);
        assert_eq!(cfg.output_dir, tmp.path().join("gen"));
    }

    #[test]
    fn load_reports_a_missing_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        let args = ExecArgs::try_parse_from(["builddag", "--config", missing.to_str().unwrap()])
            .unwrap();
        assert!(args.load().is_err());
    }

    #[test]
    fn zero_jobs_is_rejected_by_parser() {
        assert!(ExecArgs::try_parse_from(["builddag", "-j", "0"]).is_err());
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let args = ExecArgs::try_parse_from(["builddag"]).unwrap();
        let base = ExecConfig::default().with_parallelism(2);
        assert_eq!(args.apply(base.clone()), base);
        assert_eq!(args.log_level, None);
    }
}
