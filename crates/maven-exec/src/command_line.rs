//! Canonical Maven argument vectors
//!
//! Tokens are always emitted in the same order, regardless of the order the
//! spec was configured in:
//!
//! 1. `--batch-mode`, `--quiet`, `--offline`, `--threads <n>`
//! 2. less common options: file options (`--file`, `--settings`, ...), then
//!    `--projects`, reactor and update switches, checksum and failure modes,
//!    output switches, `--builder`, `--color`, `--resume-from`
//! 3. a single `-P<a,b,...>` token when profiles are active
//! 4. one `-D<key>=<value>` token per property, in insertion order
//! 5. extra JVM argument tokens
//! 6. goals, in the order supplied
//!
//! Values are never quoted or joined into a shell string; each token goes to
//! the process as its own argv entry.

use crate::error::{Error, Result};
use crate::spec::ExecutionSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered list of arguments for the Maven launcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// Build the canonical command line for a spec
    ///
    /// Fails with [`Error::Configuration`] when the spec has no goals.
    pub fn build(spec: &ExecutionSpec) -> Result<Self> {
        if spec.goals.is_empty() {
            return Err(Error::configuration("at least one goal is required"));
        }

        let mut tokens = Vec::new();

        if spec.batch_mode {
            tokens.push("--batch-mode".to_string());
        }
        if spec.quiet {
            tokens.push("--quiet".to_string());
        }
        if spec.offline {
            tokens.push("--offline".to_string());
        }
        if let Some(threads) = &spec.threads {
            tokens.push("--threads".to_string());
            tokens.push(threads.clone());
        }

        let options = &spec.options;
        let paths = [
            ("--file", &options.file),
            ("--settings", &options.settings),
            ("--global-settings", &options.global_settings),
            ("--toolchains", &options.toolchains),
            ("--global-toolchains", &options.global_toolchains),
            ("--log-file", &options.log_file),
        ];
        for (flag, path) in paths {
            if let Some(path) = path {
                tokens.push(flag.to_string());
                tokens.push(path.to_string_lossy().into_owned());
            }
        }
        if !options.projects.is_empty() {
            tokens.push("--projects".to_string());
            tokens.push(options.projects.join(","));
        }
        let switches = [
            (options.also_make, "--also-make"),
            (options.also_make_dependents, "--also-make-dependents"),
            (options.update_snapshots, "--update-snapshots"),
            (options.no_snapshot_updates, "--no-snapshot-updates"),
            (options.update_plugins, "--update-plugins"),
            (options.no_plugin_updates, "--no-plugin-updates"),
            (options.check_plugin_updates, "--check-plugin-updates"),
            (options.no_plugin_registry, "--no-plugin-registry"),
        ];
        tokens.extend(switches.iter().filter(|(on, _)| *on).map(|(_, f)| f.to_string()));
        if let Some(policy) = options.checksum_policy {
            tokens.push(policy.flag().to_string());
        }
        if let Some(mode) = options.fail_mode {
            tokens.push(mode.flag().to_string());
        }
        let switches = [
            (options.errors, "--errors"),
            (options.debug, "--debug"),
            (options.show_version, "--show-version"),
            (options.no_transfer_progress, "--no-transfer-progress"),
            (options.non_recursive, "--non-recursive"),
            (options.ignore_transitive_repositories, "--ignore-transitive-repositories"),
            (options.legacy_local_repository, "--legacy-local-repository"),
        ];
        tokens.extend(switches.iter().filter(|(on, _)| *on).map(|(_, f)| f.to_string()));
        if let Some(id) = &options.builder {
            tokens.push("--builder".to_string());
            tokens.push(id.clone());
        }
        if let Some(color) = options.color {
            tokens.push("--color".to_string());
            tokens.push(color.as_str().to_string());
        }
        if let Some(project) = &options.resume_from {
            tokens.push("--resume-from".to_string());
            tokens.push(project.clone());
        }

        if !spec.profiles.is_empty() {
            let joined: Vec<&str> = spec.profiles.iter().map(String::as_str).collect();
            tokens.push(format!("-P{}", joined.join(",")));
        }

        for (key, value) in &spec.properties {
            tokens.push(format!("-D{key}={value}"));
        }

        tokens.extend(spec.jvm_args.iter().cloned());
        tokens.extend(spec.goals.iter().cloned());

        Ok(Self { tokens })
    }

    /// The argument tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if there are no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Consume into the token vector
    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display only: spaces in tokens are shown but never interpreted.
        let rendered: Vec<String> = self
            .tokens
            .iter()
            .map(|t| {
                if t.contains(char::is_whitespace) {
                    format!("{t:?}")
                } else {
                    t.clone()
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl<'a> IntoIterator for &'a CommandLine {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
