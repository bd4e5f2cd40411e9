// src/config/mod.rs

//! Configuration loading and validation for simrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate scheduler bounds and the process template (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_relative_to};
pub use model::{
    ConfigFile, JOB_PLACEHOLDER, LogConfig, ProcessSection, RawConfigFile, SchedulerSection,
    StoreSection,
};
