// src/config/mod.rs

//! Execution configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated [`ExecConfig`]
//!   (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like `jobs >= 1` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ExecConfig, RawConfigFile, RawExecSection};
pub use validate::validate_exec_section;
