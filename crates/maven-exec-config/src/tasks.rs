//! Turning parsed settings into core types

use crate::{ConfigError, MavenSettings, Result, TaskConfig, TaskFile};
use maven_exec::executor::DEFAULT_GRACE_PERIOD;
use maven_exec::{ExecOptions, ExecutableResolver, ExecutionSpec, MavenExecutor, MavenTask};
use std::time::Duration;

impl MavenSettings {
    /// A resolver honouring `home` and `wrapper`
    pub fn resolver(&self) -> ExecutableResolver {
        let resolver = ExecutableResolver::default().wrapper(self.wrapper);
        match &self.home {
            Some(home) => resolver.explicit_path(home),
            None => resolver,
        }
    }

    /// Supervision settings for every task in the file
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            timeout: self.timeout.map(Duration::from_secs),
            grace_period: self
                .grace_period
                .map_or(DEFAULT_GRACE_PERIOD, Duration::from_secs),
            env: self
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            ..ExecOptions::default()
        }
    }
}

impl TaskConfig {
    /// Build the core spec for this task
    pub fn to_spec(&self) -> maven_exec::Result<ExecutionSpec> {
        let mut builder = ExecutionSpec::builder()
            .goals(&self.goals)?
            .profiles(&self.profiles)?
            .defines(self.define.iter().map(|(k, v)| (k.as_str(), v.to_string())))?
            .jvm_args(&self.jvm_args)
            .quiet(self.quiet)
            .batch_mode(self.batch_mode)
            .offline(self.offline)
            .projects(&self.projects)?
            .also_make(self.also_make)
            .also_make_dependents(self.also_make_dependents)
            .update_snapshots(self.update_snapshots)
            .no_snapshot_updates(self.no_snapshot_updates)
            .update_plugins(self.update_plugins)
            .no_plugin_updates(self.no_plugin_updates)
            .check_plugin_updates(self.check_plugin_updates)
            .no_plugin_registry(self.no_plugin_registry)
            .errors(self.errors)
            .debug(self.debug)
            .show_version(self.show_version)
            .no_transfer_progress(self.no_transfer_progress)
            .non_recursive(self.non_recursive)
            .ignore_transitive_repositories(self.ignore_transitive_repositories)
            .legacy_local_repository(self.legacy_local_repository);

        for (key, value) in &self.env {
            builder = builder.env(key.as_str(), value.to_string())?;
        }
        if let Some(threads) = &self.threads {
            builder = builder.threads(threads.to_string())?;
        }
        if let Some(dir) = &self.working_dir {
            builder = builder.working_dir(dir);
        }
        if let Some(file) = &self.file {
            builder = builder.file(file);
        }
        if let Some(settings) = &self.settings {
            builder = builder.settings(settings);
        }
        if let Some(settings) = &self.global_settings {
            builder = builder.global_settings(settings);
        }
        if let Some(toolchains) = &self.toolchains {
            builder = builder.toolchains(toolchains);
        }
        if let Some(toolchains) = &self.global_toolchains {
            builder = builder.global_toolchains(toolchains);
        }
        if let Some(log_file) = &self.log_file {
            builder = builder.log_file(log_file);
        }
        if let Some(policy) = self.checksums {
            builder = builder.checksum_policy(policy);
        }
        if let Some(mode) = self.fail_mode {
            builder = builder.fail_mode(mode);
        }
        if let Some(id) = &self.builder {
            builder = builder.builder(id.as_str())?;
        }
        if let Some(color) = self.color {
            builder = builder.color(color);
        }
        if let Some(project) = &self.resume_from {
            builder = builder.resume_from(project.as_str())?;
        }

        Ok(builder.build())
    }
}

impl TaskFile {
    /// Task names in file order
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Build the named task
    pub fn task(&self, name: &str) -> Result<MavenTask> {
        let config = self
            .tasks
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))?;
        let spec = config.to_spec().map_err(|source| ConfigError::Spec {
            task: name.to_string(),
            source,
        })?;

        Ok(MavenTask::new(name, spec)
            .inputs(config.inputs.iter().cloned())
            .outputs(config.outputs.iter().cloned()))
    }

    /// Build every task, in file order
    pub fn all_tasks(&self) -> Result<Vec<MavenTask>> {
        self.task_names().map(|name| self.task(name)).collect()
    }

    /// A local executor configured from the `maven:` section
    pub fn executor(&self) -> MavenExecutor {
        MavenExecutor::local(self.maven.resolver()).with_options(self.maven.exec_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use maven_exec::Error;
    use std::path::PathBuf;

    const TASKS: &str = r#"
version: "1.0"
maven:
  home: /opt/maven
  timeout: 600
  grace_period: 5
  env:
    MAVEN_OPTS: "-Xmx1g"
tasks:
  build:
    goals: [clean, install]
    profiles: [ci]
    define:
      skipTests: true
      revision: 2
    batch_mode: true
    threads: 1C
    projects: [core, api]
    also_make: true
    fail_mode: at_end
    no_transfer_progress: true
    inputs: [pom.xml]
    outputs: [target]
  site:
    goals: [site]
    threads: 4
"#;

    #[test]
    fn test_task_converts_to_canonical_command_line() {
        let file = parse_str(TASKS).unwrap();
        let task = file.task("build").unwrap();

        assert_eq!(
            task.command_line().unwrap().tokens(),
            [
                "--batch-mode",
                "--threads",
                "1C",
                "--projects",
                "core,api",
                "--also-make",
                "--fail-at-end",
                "--no-transfer-progress",
                "-Pci",
                "-DskipTests=true",
                "-Drevision=2",
                "clean",
                "install",
            ]
        );
        assert_eq!(task.declared_inputs(), [PathBuf::from("pom.xml")]);
        assert_eq!(task.declared_outputs(), [PathBuf::from("target")]);
    }

    #[test]
    fn test_numeric_threads_accepted() {
        let file = parse_str(TASKS).unwrap();
        let site = file.task("site").unwrap();
        assert_eq!(site.spec().threads(), Some("4"));
    }

    #[test]
    fn test_settings_become_executor_options() {
        let file = parse_str(TASKS).unwrap();
        let options = file.maven.exec_options();
        assert_eq!(options.timeout, Some(Duration::from_secs(600)));
        assert_eq!(options.grace_period, Duration::from_secs(5));
        assert_eq!(options.env.get("MAVEN_OPTS").map(String::as_str), Some("-Xmx1g"));
    }

    #[test]
    fn test_tasks_keep_file_order() {
        let file = parse_str(TASKS).unwrap();
        let names: Vec<_> = file.task_names().collect();
        assert_eq!(names, ["build", "site"]);
        assert_eq!(file.all_tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_task() {
        let file = parse_str(TASKS).unwrap();
        assert!(matches!(
            file.task("deploy"),
            Err(ConfigError::TaskNotFound(name)) if name == "deploy"
        ));
    }

    #[test]
    fn test_plugin_and_repository_options() {
        let yaml = r#"
version: "1.0"
tasks:
  release:
    goals: [deploy]
    global_settings: /etc/maven/settings.xml
    toolchains: toolchains.xml
    log_file: release.log
    no_snapshot_updates: true
    check_plugin_updates: true
    checksums: strict
    show_version: true
    ignore_transitive_repositories: true
    builder: multithreaded
    color: never
"#;
        let file = parse_str(yaml).unwrap();
        let task = file.task("release").unwrap();
        assert_eq!(
            task.command_line().unwrap().tokens(),
            [
                "--global-settings",
                "/etc/maven/settings.xml",
                "--toolchains",
                "toolchains.xml",
                "--log-file",
                "release.log",
                "--no-snapshot-updates",
                "--check-plugin-updates",
                "--strict-checksums",
                "--show-version",
                "--ignore-transitive-repositories",
                "--builder",
                "multithreaded",
                "--color",
                "never",
                "deploy",
            ]
        );
    }

    #[test]
    fn test_unknown_color_rejected() {
        let yaml = r#"
version: "1.0"
tasks:
  build:
    goals: [install]
    color: rainbow
"#;
        assert!(matches!(parse_str(yaml), Err(ConfigError::YamlError(_))));
    }

    #[test]
    fn test_invalid_threads_rejected_by_builder() {
        let config = TaskConfig {
            goals: vec!["install".into()],
            threads: Some("many".into()),
            ..Default::default()
        };
        assert!(matches!(config.to_spec(), Err(Error::Configuration { .. })));
    }
}
