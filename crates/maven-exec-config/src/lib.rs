//! # Maven Exec Configuration
//!
//! YAML task file parser for maven-exec.
//!
//! A task file names Maven invocations and the launcher settings they share.
//! Parsing checks every task against the same rules the core builder
//! enforces, so a file that loads is a file whose tasks can all be run.

#![warn(missing_docs)]

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod parser;
pub mod tasks;

pub use parser::{parse_file, parse_str, substitute_env_vars};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// Task reference not found
    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    /// A task the core builder rejected
    #[error("Task '{task}': {source}")]
    Spec {
        /// Name of the offending task
        task: String,
        /// What the builder reported
        #[source]
        source: maven_exec::Error,
    },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root of a task file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFile {
    /// Configuration version
    pub version: String,

    /// Launcher and supervision settings shared by every task
    #[serde(default)]
    pub maven: MavenSettings,

    /// Task definitions, in file order
    #[serde(default)]
    pub tasks: IndexMap<String, TaskConfig>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// The `maven:` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MavenSettings {
    /// Explicit launcher or installation directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    /// Prefer the project's Maven wrapper
    #[serde(default)]
    pub wrapper: bool,

    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Seconds between the termination signal and a forced kill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u64>,

    /// Variables added to every task's environment
    #[serde(default)]
    pub env: IndexMap<String, Scalar>,
}

/// One task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Goals and phases
    #[serde(default)]
    pub goals: Vec<String>,

    /// Profiles to activate
    #[serde(default)]
    pub profiles: Vec<String>,

    /// System properties
    #[serde(default)]
    pub define: IndexMap<String, Scalar>,

    /// Extra JVM argument tokens
    #[serde(default)]
    pub jvm_args: Vec<String>,

    /// `--quiet`
    #[serde(default)]
    pub quiet: bool,

    /// `--batch-mode`
    #[serde(default)]
    pub batch_mode: bool,

    /// `--offline`
    #[serde(default)]
    pub offline: bool,

    /// Thread count, e.g. `4` or `1C`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<Scalar>,

    /// Directory Maven runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Variables for this task only
    #[serde(default)]
    pub env: IndexMap<String, Scalar>,

    /// Declared input paths
    #[serde(default)]
    pub inputs: Vec<PathBuf>,

    /// Declared output paths
    #[serde(default)]
    pub outputs: Vec<PathBuf>,

    /// Alternate POM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Alternate user settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PathBuf>,

    /// Alternate global settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_settings: Option<PathBuf>,

    /// Alternate user toolchains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchains: Option<PathBuf>,

    /// Alternate global toolchains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_toolchains: Option<PathBuf>,

    /// File Maven writes its output to instead of stdout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Reactor projects to build
    #[serde(default)]
    pub projects: Vec<String>,

    /// `--also-make`
    #[serde(default)]
    pub also_make: bool,

    /// `--also-make-dependents`
    #[serde(default)]
    pub also_make_dependents: bool,

    /// `--update-snapshots`
    #[serde(default)]
    pub update_snapshots: bool,

    /// `--no-snapshot-updates`
    #[serde(default)]
    pub no_snapshot_updates: bool,

    /// `--update-plugins`
    #[serde(default)]
    pub update_plugins: bool,

    /// `--no-plugin-updates`
    #[serde(default)]
    pub no_plugin_updates: bool,

    /// `--check-plugin-updates`
    #[serde(default)]
    pub check_plugin_updates: bool,

    /// `--no-plugin-registry`
    #[serde(default)]
    pub no_plugin_registry: bool,

    /// `strict` or `lax` checksum verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksums: Option<maven_exec::ChecksumPolicy>,

    /// Reactor failure behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_mode: Option<maven_exec::FailMode>,

    /// `--errors`
    #[serde(default)]
    pub errors: bool,

    /// `--debug`
    #[serde(default)]
    pub debug: bool,

    /// `--show-version`
    #[serde(default)]
    pub show_version: bool,

    /// `--no-transfer-progress`
    #[serde(default)]
    pub no_transfer_progress: bool,

    /// `--non-recursive`
    #[serde(default)]
    pub non_recursive: bool,

    /// `--ignore-transitive-repositories`
    #[serde(default)]
    pub ignore_transitive_repositories: bool,

    /// `--legacy-local-repository`
    #[serde(default)]
    pub legacy_local_repository: bool,

    /// Build strategy id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,

    /// `auto`, `always` or `never`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<maven_exec::ColorMode>,

    /// Project to resume the reactor from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<String>,
}

/// A YAML scalar used where Maven expects text
///
/// `skipTests: true` and `threads: 4` are written without quotes in practice;
/// both end up as the text Maven sees. Unquoted decimals are rejected: YAML
/// reads `1.10` as the number `1.1`, and the original text cannot be recovered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// `true` / `false`
    Bool(bool),
    /// Whole number
    Int(i64),
    /// Anything else
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, whole number or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
        Ok(i64::try_from(v).map_or_else(|_| Scalar::Text(v.to_string()), Scalar::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
        Err(E::custom(format!(
            "unquoted decimal {v} may not reach maven as written, quote it"
        )))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Text(v))
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}
