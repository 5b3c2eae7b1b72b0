//! Task file parser with environment variable substitution

use crate::{ConfigError, Result, TaskFile};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// The only task file version understood
pub const SUPPORTED_VERSION: &str = "1.0";

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Parse a YAML task file
///
/// Relative paths in the file are resolved against the file's directory.
pub fn parse_file(path: impl AsRef<Path>) -> Result<TaskFile> {
    let path = std::path::absolute(path.as_ref())?;
    debug!(path = %path.display(), "loading task file");
    let content = std::fs::read_to_string(&path)?;
    let base_dir = path.parent().map(Path::to_path_buf);
    parse_with_base(&content, base_dir)
}

/// Parse a YAML task file from a string
///
/// Relative paths are left as written.
pub fn parse_str(content: &str) -> Result<TaskFile> {
    parse_with_base(content, None)
}

fn parse_with_base(content: &str, base_dir: Option<PathBuf>) -> Result<TaskFile> {
    let content = substitute_env_vars(content)?;
    let mut file: TaskFile = serde_yaml::from_str(&content)?;
    if let Some(base) = base_dir {
        resolve_paths(&mut file, &base);
        file.base_dir = Some(base);
    }
    validate_file(&file)?;
    Ok(file)
}

/// Validate configuration
fn validate_file(file: &TaskFile) -> Result<()> {
    if file.version != SUPPORTED_VERSION {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported version: {}, expected {}",
            file.version, SUPPORTED_VERSION
        )));
    }

    if file
        .maven
        .home
        .as_ref()
        .is_some_and(|home| home.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "maven.home must not be empty".to_string(),
        ));
    }

    if file.maven.grace_period == Some(0) {
        return Err(ConfigError::ValidationError(
            "maven.grace_period must be at least one second".to_string(),
        ));
    }

    for name in file.tasks.keys() {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "task names must not be blank".to_string(),
            ));
        }
        // Runs the task through the core builder and command line rules
        file.task(name)?.command_line().map_err(|source| ConfigError::Spec {
            task: name.clone(),
            source,
        })?;
    }

    Ok(())
}

fn resolve_paths(file: &mut TaskFile, base: &Path) {
    let resolve = |path: &mut PathBuf| {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    };

    if let Some(home) = file.maven.home.as_mut().filter(|h| !h.as_os_str().is_empty()) {
        resolve(home);
    }

    for task in file.tasks.values_mut() {
        // Tasks without a working directory run in the file's directory
        match task.working_dir.as_mut() {
            Some(dir) => resolve(dir),
            None => task.working_dir = Some(base.to_path_buf()),
        }
        task.file.iter_mut().for_each(resolve);
        task.settings.iter_mut().for_each(resolve);
        task.global_settings.iter_mut().for_each(resolve);
        task.toolchains.iter_mut().for_each(resolve);
        task.global_toolchains.iter_mut().for_each(resolve);
        task.log_file.iter_mut().for_each(resolve);
        task.inputs.iter_mut().for_each(resolve);
        task.outputs.iter_mut().for_each(resolve);
    }
}

/// Substitute `${VAR}` and `${VAR:-default}` from the process environment
///
/// Every undefined variable without a default is reported in one error.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    substitute_with(input, |name| std::env::var(name).ok())
}

/// Substitute variables using `lookup` instead of the process environment
pub fn substitute_with<F>(input: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();

    let result = ENV_VAR_PATTERN.replace_all(input, |cap: &Captures<'_>| {
        let var_expr = &cap[1];

        // Handle default values: ${VAR:-default}
        let (var_name, default_value) = match var_expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (var_expr, None),
        };

        match (lookup(var_name), default_value) {
            (Some(value), _) => value,
            (None, Some(default)) => default.to_string(),
            (None, None) => {
                missing.push(var_name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::EnvVarNotFound(missing.join(", ")));
    }

    Ok(result.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_env_var_substitution() {
        let env = lookup(&[("PROFILE", "ci")]);
        assert_eq!(substitute_with("${PROFILE}", &env).unwrap(), "ci");
        assert_eq!(
            substitute_with("prefix-${PROFILE}-suffix", &env).unwrap(),
            "prefix-ci-suffix"
        );
    }

    #[test]
    fn test_env_var_with_default() {
        let env = lookup(&[("MAVEN_HOME", "/opt/maven")]);
        assert_eq!(
            substitute_with("${MISSING:-default_value}", &env).unwrap(),
            "default_value"
        );
        assert_eq!(substitute_with("${MISSING:-}", &env).unwrap(), "");
        assert_eq!(
            substitute_with("${MAVEN_HOME:-/usr/share/maven}", &env).unwrap(),
            "/opt/maven"
        );
    }

    #[test]
    fn test_missing_vars_reported_together() {
        let err = substitute_with("${A} ${B:-b} ${C}", lookup(&[])).unwrap_err();
        match err {
            ConfigError::EnvVarNotFound(names) => assert_eq!(names, "A, C"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_process_environment_is_used() {
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(substitute_env_vars("${PATH:-none}").unwrap(), path);
        }
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
version: "1.0"
tasks:
  build:
    goals: [install]
"#;

        let file = parse_str(yaml).unwrap();
        assert_eq!(file.version, "1.0");
        assert_eq!(file.tasks.len(), 1);
        assert!(file.tasks.contains_key("build"));
        assert_eq!(file.maven, crate::MavenSettings::default());
    }

    #[test]
    fn test_relative_paths_resolved_against_base() {
        let yaml = r#"
version: "1.0"
maven:
  home: tools/maven
tasks:
  build:
    goals: [install]
    working_dir: backend
    file: backend/pom.xml
    inputs: [backend/src, /abs/input]
  lint:
    goals: [validate]
"#;
        let base = Path::new("/work/repo");
        let file = parse_with_base(yaml, Some(base.to_path_buf())).unwrap();

        assert_eq!(file.maven.home, Some(base.join("tools/maven")));
        let build = &file.tasks["build"];
        assert_eq!(build.working_dir, Some(base.join("backend")));
        assert_eq!(build.file, Some(base.join("backend/pom.xml")));
        assert_eq!(
            build.inputs,
            vec![base.join("backend/src"), PathBuf::from("/abs/input")]
        );
        assert_eq!(file.tasks["lint"].working_dir, Some(base.to_path_buf()));
    }
}
