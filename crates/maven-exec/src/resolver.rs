//! Locating the Maven launcher
//!
//! All knowledge of platform-specific launcher names lives here. Resolution
//! tries, in order:
//!
//! 1. an explicitly configured path (a launcher file or an install directory)
//! 2. `mvnw` in the working directory, when wrapper lookup is enabled
//! 3. the home variables (`MAVEN_HOME`, then `M2_HOME`) plus `bin/`
//! 4. every directory on `PATH`
//!
//! The first hit wins. Nothing here spawns a process.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Home variables consulted, in order
pub const HOME_VARIABLES: &[&str] = &["MAVEN_HOME", "M2_HOME"];

/// The operating system family a launcher is resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux, macOS and other POSIX systems
    Unix,
    /// Windows
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) { Platform::Windows } else { Platform::Unix }
    }

    /// Launcher file names inside a Maven `bin/` directory, preferred first
    fn launcher_names(&self) -> &'static [&'static str] {
        match self {
            Platform::Unix => &["mvn"],
            // mvn.bat shipped with Maven 2 and early 3.x
            Platform::Windows => &["mvn.cmd", "mvn.bat"],
        }
    }

    fn wrapper_name(&self) -> &'static str {
        match self {
            Platform::Unix => "mvnw",
            Platform::Windows => "mvnw.cmd",
        }
    }

    fn kind(&self) -> LauncherKind {
        match self {
            Platform::Unix => LauncherKind::PosixScript,
            Platform::Windows => LauncherKind::WindowsCommand,
        }
    }

    fn path_separator(&self) -> char {
        match self {
            Platform::Unix => ':',
            Platform::Windows => ';',
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Unix => write!(f, "unix"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

/// What kind of launcher was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LauncherKind {
    /// A POSIX shell script (`mvn`, `mvnw`)
    PosixScript,
    /// A Windows command script (`mvn.cmd`, `mvn.bat`, `mvnw.cmd`)
    WindowsCommand,
}

/// Where a launcher was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The caller configured this path
    Explicit,
    /// A Maven wrapper next to the project
    Wrapper,
    /// Derived from a home variable
    HomeVariable(String),
    /// Found on `PATH`
    Path,
}

/// A resolved launcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutableLocation {
    /// Absolute path to the launcher
    pub path: PathBuf,
    /// Script flavour of the launcher
    pub kind: LauncherKind,
    /// How the launcher was found
    pub source: ResolutionSource,
}

/// Read access to environment variables
///
/// Abstracted so resolution can be tested without touching the real
/// process environment.
pub trait Environment: Send + Sync {
    /// Look up a variable
    fn var(&self, key: &str) -> Option<OsString>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

/// An in-memory environment
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, OsString>,
}

impl MapEnvironment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }
}

/// Finds the Maven launcher for a platform
pub struct ExecutableResolver {
    platform: Platform,
    explicit: Option<PathBuf>,
    wrapper: bool,
    working_dir: Option<PathBuf>,
    env: Box<dyn Environment>,
}

impl fmt::Debug for ExecutableResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableResolver")
            .field("platform", &self.platform)
            .field("explicit", &self.explicit)
            .field("wrapper", &self.wrapper)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

impl Default for ExecutableResolver {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl ExecutableResolver {
    /// Create a resolver reading the real environment
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            explicit: None,
            wrapper: false,
            working_dir: None,
            env: Box::new(SystemEnvironment),
        }
    }

    /// Use this launcher file or Maven installation directory
    pub fn explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Look for a Maven wrapper in the working directory
    pub fn wrapper(mut self, enabled: bool) -> Self {
        self.wrapper = enabled;
        self
    }

    /// Directory searched for the wrapper
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace the environment used for home and `PATH` lookups
    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// The platform launchers are resolved for
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve using the configured working directory
    pub fn resolve(&self) -> Result<ExecutableLocation> {
        self.resolve_in(self.working_dir.as_deref())
    }

    /// Resolve, looking for the wrapper in `working_dir` when given
    ///
    /// A configured working directory on the resolver takes precedence.
    pub fn resolve_in(&self, working_dir: Option<&Path>) -> Result<ExecutableLocation> {
        let mut tried = Vec::new();

        if let Some(explicit) = &self.explicit {
            debug!(path = %explicit.display(), "checking explicit maven path");
            return self
                .explicit_location(explicit)
                .ok_or_else(|| {
                    Error::not_found(format!(
                        "configured path {} is not a maven launcher or installation",
                        explicit.display()
                    ))
                });
        }

        if self.wrapper {
            let dir = self.working_dir.as_deref().or(working_dir);
            match dir {
                Some(dir) => {
                    let candidate = dir.join(self.platform.wrapper_name());
                    debug!(path = %candidate.display(), "checking maven wrapper");
                    if is_launcher(&candidate, self.platform) {
                        return Ok(self.location(candidate, ResolutionSource::Wrapper));
                    }
                    tried.push(candidate.display().to_string());
                }
                None => debug!("wrapper lookup enabled without a working directory"),
            }
        }

        for var in HOME_VARIABLES {
            let Some(home) = self.env.var(var).filter(|v| !v.is_empty()) else {
                continue;
            };
            let bin = PathBuf::from(home).join("bin");
            debug!(variable = %var, dir = %bin.display(), "checking maven home");
            if let Some(path) = self.find_in_dir(&bin) {
                return Ok(self.location(path, ResolutionSource::HomeVariable(var.to_string())));
            }
            tried.push(format!("${var}/bin"));
        }

        if let Some(path_var) = self.env.var("PATH") {
            for dir in self.path_entries(&path_var) {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                if let Some(path) = self.find_in_dir(&dir) {
                    debug!(path = %path.display(), "found maven on PATH");
                    return Ok(self.location(path, ResolutionSource::Path));
                }
            }
            tried.push("PATH".to_string());
        }

        Err(Error::not_found(if tried.is_empty() {
            "no explicit path, home variable or PATH available".to_string()
        } else {
            format!("searched {}", tried.join(", "))
        }))
    }

    /// Split a `PATH` value; the host's own rules apply when resolving for the host
    fn path_entries(&self, path_var: &OsStr) -> Vec<PathBuf> {
        if self.platform == Platform::current() {
            return std::env::split_paths(path_var).collect();
        }
        path_var
            .to_string_lossy()
            .split(self.platform.path_separator())
            .map(PathBuf::from)
            .collect()
    }

    fn explicit_location(&self, explicit: &Path) -> Option<ExecutableLocation> {
        if is_launcher(explicit, self.platform) {
            return Some(self.location(explicit.to_path_buf(), ResolutionSource::Explicit));
        }
        if explicit.is_dir() {
            let wrapper = explicit.join(self.platform.wrapper_name());
            if is_launcher(&wrapper, self.platform) {
                return Some(self.location(wrapper, ResolutionSource::Explicit));
            }
            if let Some(path) = self.find_in_dir(&explicit.join("bin")) {
                return Some(self.location(path, ResolutionSource::Explicit));
            }
        }
        None
    }

    fn find_in_dir(&self, dir: &Path) -> Option<PathBuf> {
        self.platform
            .launcher_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| is_launcher(candidate, self.platform))
    }

    fn location(&self, path: PathBuf, source: ResolutionSource) -> ExecutableLocation {
        let path = std::path::absolute(&path).unwrap_or(path);
        ExecutableLocation {
            path,
            kind: self.platform.kind(),
            source,
        }
    }
}

fn is_launcher(path: &Path, platform: Platform) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    match platform {
        Platform::Windows => true,
        Platform::Unix => is_executable(&meta),
    }
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}
