//! Configuration model for a single Maven invocation
//!
//! An [`ExecutionSpec`] is assembled through [`ExecutionSpecBuilder`]. Every
//! fallible setter validates its input immediately, so a builder chain fails at
//! the first bad value instead of at execution time.

use crate::command_line::CommandLine;
use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static THREADS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?C?$").expect("threads pattern is valid"));

/// How Maven reacts to a failing module in a reactor build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    /// Stop at the first failure (`--fail-fast`)
    Fast,
    /// Build everything that does not depend on a failure (`--fail-at-end`)
    AtEnd,
    /// Never fail the build (`--fail-never`)
    Never,
}

impl FailMode {
    /// The Maven flag for this mode
    pub fn flag(&self) -> &'static str {
        match self {
            FailMode::Fast => "--fail-fast",
            FailMode::AtEnd => "--fail-at-end",
            FailMode::Never => "--fail-never",
        }
    }
}

/// Artifact checksum verification (`--strict-checksums` / `--lax-checksums`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumPolicy {
    /// Fail the build on a mismatch
    Strict,
    /// Warn on a mismatch
    Lax,
}

impl ChecksumPolicy {
    /// The Maven flag for this policy
    pub fn flag(&self) -> &'static str {
        match self {
            ChecksumPolicy::Strict => "--strict-checksums",
            ChecksumPolicy::Lax => "--lax-checksums",
        }
    }
}

/// Console colouring (`--color`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Colour when attached to a terminal
    Auto,
    /// Always colour
    Always,
    /// Never colour
    Never,
}

impl ColorMode {
    /// The value passed after `--color`
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        }
    }
}

/// Everything needed to describe one Maven invocation
///
/// Immutable once built; [`ExecutionSpec::builder`] is the only way to
/// construct one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSpec {
    pub(crate) goals: Vec<String>,
    pub(crate) profiles: IndexSet<String>,
    pub(crate) properties: IndexMap<String, String>,
    pub(crate) jvm_args: Vec<String>,
    pub(crate) working_dir: Option<PathBuf>,
    pub(crate) env: IndexMap<String, String>,
    pub(crate) quiet: bool,
    pub(crate) batch_mode: bool,
    pub(crate) offline: bool,
    pub(crate) threads: Option<String>,
    pub(crate) options: MavenOptions,
}

/// Less common Maven switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MavenOptions {
    pub(crate) file: Option<PathBuf>,
    pub(crate) settings: Option<PathBuf>,
    pub(crate) global_settings: Option<PathBuf>,
    pub(crate) toolchains: Option<PathBuf>,
    pub(crate) global_toolchains: Option<PathBuf>,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) projects: Vec<String>,
    pub(crate) also_make: bool,
    pub(crate) also_make_dependents: bool,
    pub(crate) update_snapshots: bool,
    pub(crate) no_snapshot_updates: bool,
    pub(crate) update_plugins: bool,
    pub(crate) no_plugin_updates: bool,
    pub(crate) check_plugin_updates: bool,
    pub(crate) no_plugin_registry: bool,
    pub(crate) checksum_policy: Option<ChecksumPolicy>,
    pub(crate) fail_mode: Option<FailMode>,
    pub(crate) errors: bool,
    pub(crate) debug: bool,
    pub(crate) show_version: bool,
    pub(crate) no_transfer_progress: bool,
    pub(crate) non_recursive: bool,
    pub(crate) ignore_transitive_repositories: bool,
    pub(crate) legacy_local_repository: bool,
    pub(crate) builder: Option<String>,
    pub(crate) color: Option<ColorMode>,
    pub(crate) resume_from: Option<String>,
}

impl ExecutionSpec {
    /// Start building a new spec
    pub fn builder() -> ExecutionSpecBuilder {
        ExecutionSpecBuilder::default()
    }

    /// Build the canonical command line for this spec
    pub fn command_line(&self) -> Result<CommandLine> {
        CommandLine::build(self)
    }

    /// Goals and phases, in the order they were supplied
    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    /// Active profiles, first occurrence order, duplicates collapsed
    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(String::as_str)
    }

    /// Property definitions in insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Extra JVM argument tokens
    pub fn jvm_args(&self) -> &[String] {
        &self.jvm_args
    }

    /// Working directory for the child process
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Environment variables merged over the inherited environment
    pub fn env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether `--quiet` is set
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Whether `--batch-mode` is set
    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }

    /// Whether `--offline` is set
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// The thread count token, if any
    pub fn threads(&self) -> Option<&str> {
        self.threads.as_deref()
    }
}

/// Fluent builder for [`ExecutionSpec`]
///
/// Setters that can reject their input return `Result<Self>` so chains read
/// as `builder.goals(..)?.profile(..)?.quiet(true)`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSpecBuilder {
    spec: ExecutionSpec,
}

impl ExecutionSpecBuilder {
    /// Append goals; each must be non-blank
    pub fn goals<I, S>(mut self, goals: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for goal in goals {
            let goal = non_blank(goal.into(), "goal")?;
            self.spec.goals.push(goal);
        }
        Ok(self)
    }

    /// Append a single goal
    pub fn goal(self, goal: impl Into<String>) -> Result<Self> {
        self.goals([goal])
    }

    /// Activate profiles; repeated names are collapsed
    pub fn profiles<I, S>(mut self, profiles: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for profile in profiles {
            let profile = non_blank(profile.into(), "profile")?;
            self.spec.profiles.insert(profile);
        }
        Ok(self)
    }

    /// Activate a single profile
    pub fn profile(self, profile: impl Into<String>) -> Result<Self> {
        self.profiles([profile])
    }

    /// Define a property. Redefining a key keeps its original position.
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = non_blank(key.into(), "property key")?;
        self.spec.properties.insert(key, value.into());
        Ok(self)
    }

    /// Define several properties, in iteration order
    pub fn defines<I, K, V>(mut self, properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in properties {
            self = self.define(key, value)?;
        }
        Ok(self)
    }

    /// Append extra JVM argument tokens
    pub fn jvm_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.jvm_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = non_blank(key.into(), "environment variable name")?;
        self.spec.env.insert(key, value.into());
        Ok(self)
    }

    /// Toggle `--quiet`
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.spec.quiet = quiet;
        self
    }

    /// Toggle `--batch-mode`
    pub fn batch_mode(mut self, batch_mode: bool) -> Self {
        self.spec.batch_mode = batch_mode;
        self
    }

    /// Toggle `--offline`
    pub fn offline(mut self, offline: bool) -> Self {
        self.spec.offline = offline;
        self
    }

    /// Set the thread count, e.g. `4` or `1.5C`
    pub fn threads(mut self, threads: impl Into<String>) -> Result<Self> {
        let threads = threads.into();
        if !THREADS_PATTERN.is_match(&threads) {
            return Err(Error::configuration(format!(
                "malformed threads value '{threads}', expected a count like 4 or 1.5C"
            )));
        }
        self.spec.threads = Some(threads);
        Ok(self)
    }

    /// Set the working directory of the child process
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.working_dir = Some(dir.into());
        self
    }

    /// Use an alternate POM (`--file`)
    pub fn file(mut self, pom: impl Into<PathBuf>) -> Self {
        self.spec.options.file = Some(pom.into());
        self
    }

    /// Use an alternate user settings file (`--settings`)
    pub fn settings(mut self, settings: impl Into<PathBuf>) -> Self {
        self.spec.options.settings = Some(settings.into());
        self
    }

    /// Use an alternate global settings file (`--global-settings`)
    pub fn global_settings(mut self, settings: impl Into<PathBuf>) -> Self {
        self.spec.options.global_settings = Some(settings.into());
        self
    }

    /// Use an alternate user toolchains file (`--toolchains`)
    pub fn toolchains(mut self, toolchains: impl Into<PathBuf>) -> Self {
        self.spec.options.toolchains = Some(toolchains.into());
        self
    }

    /// Use an alternate global toolchains file (`--global-toolchains`)
    pub fn global_toolchains(mut self, toolchains: impl Into<PathBuf>) -> Self {
        self.spec.options.global_toolchains = Some(toolchains.into());
        self
    }

    /// Have Maven write its output to a file (`--log-file`)
    ///
    /// Maven then prints nothing to stdout, so the sink and the output tail
    /// stay empty.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec.options.log_file = Some(path.into());
        self
    }

    /// Restrict the reactor to the given projects (`--projects`)
    pub fn projects<I, S>(mut self, projects: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for project in projects {
            let project = non_blank(project.into(), "project selector")?;
            self.spec.options.projects.push(project);
        }
        Ok(self)
    }

    /// Also build projects required by the selection (`--also-make`)
    pub fn also_make(mut self, also_make: bool) -> Self {
        self.spec.options.also_make = also_make;
        self
    }

    /// Also build projects depending on the selection (`--also-make-dependents`)
    pub fn also_make_dependents(mut self, also_make_dependents: bool) -> Self {
        self.spec.options.also_make_dependents = also_make_dependents;
        self
    }

    /// Force a check for updated snapshots (`--update-snapshots`)
    pub fn update_snapshots(mut self, update_snapshots: bool) -> Self {
        self.spec.options.update_snapshots = update_snapshots;
        self
    }

    /// Suppress snapshot updates (`--no-snapshot-updates`)
    pub fn no_snapshot_updates(mut self, no_snapshot_updates: bool) -> Self {
        self.spec.options.no_snapshot_updates = no_snapshot_updates;
        self
    }

    /// Force plugin updates (`--update-plugins`)
    pub fn update_plugins(mut self, update_plugins: bool) -> Self {
        self.spec.options.update_plugins = update_plugins;
        self
    }

    /// Suppress plugin updates (`--no-plugin-updates`)
    pub fn no_plugin_updates(mut self, no_plugin_updates: bool) -> Self {
        self.spec.options.no_plugin_updates = no_plugin_updates;
        self
    }

    /// Check for plugin updates (`--check-plugin-updates`)
    pub fn check_plugin_updates(mut self, check_plugin_updates: bool) -> Self {
        self.spec.options.check_plugin_updates = check_plugin_updates;
        self
    }

    /// Skip the plugin registry (`--no-plugin-registry`)
    pub fn no_plugin_registry(mut self, no_plugin_registry: bool) -> Self {
        self.spec.options.no_plugin_registry = no_plugin_registry;
        self
    }

    /// Checksum verification for downloaded artifacts
    pub fn checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.spec.options.checksum_policy = Some(policy);
        self
    }

    /// Reactor failure behaviour
    pub fn fail_mode(mut self, mode: FailMode) -> Self {
        self.spec.options.fail_mode = Some(mode);
        self
    }

    /// Produce execution error messages (`--errors`)
    pub fn errors(mut self, errors: bool) -> Self {
        self.spec.options.errors = errors;
        self
    }

    /// Produce debug output (`--debug`)
    pub fn debug(mut self, debug: bool) -> Self {
        self.spec.options.debug = debug;
        self
    }

    /// Print the version and keep building (`--show-version`)
    pub fn show_version(mut self, show_version: bool) -> Self {
        self.spec.options.show_version = show_version;
        self
    }

    /// Suppress download progress (`--no-transfer-progress`)
    pub fn no_transfer_progress(mut self, no_transfer_progress: bool) -> Self {
        self.spec.options.no_transfer_progress = no_transfer_progress;
        self
    }

    /// Do not recurse into sub-projects (`--non-recursive`)
    pub fn non_recursive(mut self, non_recursive: bool) -> Self {
        self.spec.options.non_recursive = non_recursive;
        self
    }

    /// Ignore repositories declared by dependencies (`--ignore-transitive-repositories`)
    pub fn ignore_transitive_repositories(mut self, ignore: bool) -> Self {
        self.spec.options.ignore_transitive_repositories = ignore;
        self
    }

    /// Use the Maven 2 local repository layout (`--legacy-local-repository`)
    pub fn legacy_local_repository(mut self, legacy: bool) -> Self {
        self.spec.options.legacy_local_repository = legacy;
        self
    }

    /// Build strategy id, e.g. `multithreaded` (`--builder`)
    pub fn builder(mut self, id: impl Into<String>) -> Result<Self> {
        let id = non_blank(id.into(), "builder id")?;
        self.spec.options.builder = Some(id);
        Ok(self)
    }

    /// Console colouring (`--color`)
    pub fn color(mut self, mode: ColorMode) -> Self {
        self.spec.options.color = Some(mode);
        self
    }

    /// Resume the reactor from a project (`--resume-from`)
    pub fn resume_from(mut self, project: impl Into<String>) -> Result<Self> {
        let project = non_blank(project.into(), "resume-from project")?;
        self.spec.options.resume_from = Some(project);
        Ok(self)
    }

    /// Finish building. Goals are checked when the command line is built.
    pub fn build(self) -> ExecutionSpec {
        self.spec
    }
}

fn non_blank(value: String, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::configuration(format!("{what} must not be blank")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_goal_rejected() {
        let err = ExecutionSpec::builder().goals(["clean", "  "]).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_blank_profile_and_key_rejected() {
        assert!(matches!(
            ExecutionSpec::builder().profile(""),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            ExecutionSpec::builder().define(" ", "x"),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            ExecutionSpec::builder().env("", "x"),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_threads_validation() {
        for good in ["4", "1.5C", "2C", "10", "0.5"] {
            assert!(ExecutionSpec::builder().threads(good).is_ok(), "{good}");
        }
        for bad in ["abc", "", "C", "1.", "-1", "4c", "1.5CC", " 4"] {
            assert!(
                matches!(
                    ExecutionSpec::builder().threads(bad),
                    Err(Error::Configuration { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_blank_builder_rejected() {
        assert!(matches!(
            ExecutionSpec::builder().builder(" "),
            Err(Error::Configuration { .. })
        ));
        assert!(ExecutionSpec::builder().builder("singlethreaded").is_ok());
    }

    #[test]
    fn test_profiles_collapse_duplicates() {
        let spec = ExecutionSpec::builder()
            .profiles(["ci", "release", "ci"])
            .unwrap()
            .build();
        assert_eq!(spec.profiles().collect::<Vec<_>>(), vec!["ci", "release"]);
    }

    #[test]
    fn test_redefined_property_keeps_position() {
        let spec = ExecutionSpec::builder()
            .define("a", "1")
            .unwrap()
            .define("b", "2")
            .unwrap()
            .define("a", "3")
            .unwrap()
            .build();
        assert_eq!(
            spec.properties().collect::<Vec<_>>(),
            vec![("a", "3"), ("b", "2")]
        );
    }

    #[test]
    fn test_builder_chain() -> Result<()> {
        let spec = ExecutionSpec::builder()
            .goals(["clean", "install"])?
            .profile("ci")?
            .defines([("skipTests", "true")])?
            .quiet(true)
            .batch_mode(true)
            .working_dir("/work")
            .build();

        assert_eq!(spec.goals(), ["clean", "install"]);
        assert!(spec.is_quiet());
        assert!(spec.is_batch_mode());
        assert!(!spec.is_offline());
        assert_eq!(spec.working_dir(), Some(Path::new("/work")));
        Ok(())
    }
}
