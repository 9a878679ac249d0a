// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;

use builddag::cli::ExecArgs;
use builddag::config::{load_and_validate, load_from_path};
use builddag::errors::BuilddagError;
use builddag::types::MissingInputPolicy;
use clap::Parser;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn loads_and_resolves_directories() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Builddag.toml");
    fs::write(
        &path,
        r#"
[exec]
jobs = 4
keep_going = true
missing_inputs = "error"
output_dir = "build"
"#,
    )?;

    let config = load_and_validate(&path)?;

    assert_eq!(config.parallelism, 4);
    assert!(config.keep_going);
    assert!(!config.force);
    assert_eq!(config.missing_inputs, MissingInputPolicy::Error);
    assert_eq!(config.working_dir, tmp.path().join("."));
    assert_eq!(config.output_dir, tmp.path().join("build"));
    Ok(())
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Builddag.toml");
    fs::write(&path, "")?;

    let config = load_and_validate(&path)?;

    assert_eq!(config.parallelism, 1);
    assert_eq!(config.missing_inputs, MissingInputPolicy::Warn);
    assert_eq!(config.output_dir, config.working_dir);
    Ok(())
}

#[test]
fn zero_jobs_is_rejected() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Builddag.toml");
    fs::write(&path, "[exec]\njobs = 0\n")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, BuilddagError::ConfigError(_)));
    assert!(err.to_string().contains("jobs"));
    Ok(())
}

#[test]
fn unknown_keys_and_bad_values_are_toml_errors() -> TestResult {
    let tmp = tempfile::tempdir()?;

    let typo = tmp.path().join("typo.toml");
    fs::write(&typo, "[exec]\nparallel = 2\n")?;
    assert!(matches!(
        load_from_path(&typo).unwrap_err(),
        BuilddagError::TomlError(_)
    ));

    let policy = tmp.path().join("policy.toml");
    fs::write(&policy, "[exec]\nmissing_inputs = \"ignore\"\n")?;
    assert!(matches!(
        load_and_validate(&policy).unwrap_err(),
        BuilddagError::TomlError(_)
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_and_validate("/definitely/not/here/Builddag.toml").unwrap_err();
    assert!(matches!(err, BuilddagError::IoError(_)));
}

#[test]
fn cli_flags_override_file() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Builddag.toml");
    fs::write(&path, "[exec]\njobs = 2\n")?;

    let args = ExecArgs::try_parse_from([
        "builddag",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
        "-j",
        "8",
        "-k",
    ])?;
    let config = args.apply(load_and_validate(args.config.as_ref().ok_or("no config")?)?);

    assert_eq!(config.parallelism, 8);
    assert!(config.keep_going);
    assert!(ExecArgs::try_parse_from(["builddag", "-j", "0"]).is_err());
    Ok(())
}
