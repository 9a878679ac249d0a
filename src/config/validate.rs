// src/config/validate.rs

use crate::config::model::{ExecConfig, RawConfigFile, RawExecSection};
use crate::errors::{BuilddagError, Result};

impl TryFrom<RawConfigFile> for ExecConfig {
    type Error = BuilddagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_exec_section(&raw.exec)?;
        Ok(ExecConfig::new_unchecked(raw.exec))
    }
}

/// Validate a raw `[exec]` section.
pub fn validate_exec_section(exec: &RawExecSection) -> Result<()> {
    if exec.jobs == 0 {
        return Err(BuilddagError::ConfigError(
            "[exec].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    for (key, dir) in [("working_dir", &exec.working_dir), ("output_dir", &exec.output_dir)] {
        if let Some(dir) = dir {
            if dir.as_os_str().is_empty() {
                return Err(BuilddagError::ConfigError(format!(
                    "[exec].{key} must not be empty"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::MissingInputPolicy;

    #[test]
    fn defaults_are_valid() {
        let cfg = ExecConfig::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg, ExecConfig::default());
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let raw: RawConfigFile = toml::from_str("[exec]\njobs = 0\n").unwrap();
        match ExecConfig::try_from(raw) {
            Err(BuilddagError::ConfigError(msg)) => assert!(msg.contains("jobs")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn output_dir_defaults_to_working_dir() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[exec]
jobs = 3
missing_inputs = "error"
working_dir = "proj"
"#,
        )
        .unwrap();
        let cfg = ExecConfig::try_from(raw).unwrap();
        assert_eq!(cfg.parallelism, 3);
        assert_eq!(cfg.missing_inputs, MissingInputPolicy::Error);
        assert_eq!(cfg.output_dir, PathBuf::from("proj"));
    }

    #[test]
    fn empty_dir_is_rejected() {
        let raw: RawConfigFile = toml::from_str("[exec]\noutput_dir = \"\"\n").unwrap();
        assert!(ExecConfig::try_from(raw).is_err());
    }
}
