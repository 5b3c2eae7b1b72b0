//! A fully prepared process invocation

use async_process::Command as AsyncCommand;
use indexmap::IndexMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::command_line::CommandLine;
use crate::resolver::ExecutableLocation;

/// A program, its argv and the process environment it runs with
///
/// Unlike `async_process::Command` this type is `Clone` and can be inspected,
/// which lets tests and fake launchers see exactly what would be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: PathBuf,
    args: Vec<OsString>,
    env: IndexMap<OsString, OsString>,
    current_dir: Option<PathBuf>,
}

impl Command {
    /// Create a new command for the given program
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: IndexMap::new(),
            current_dir: None,
        }
    }

    /// A command running a resolved launcher with a canonical command line
    pub fn for_launcher(location: &ExecutableLocation, command_line: &CommandLine) -> Self {
        let mut cmd = Self::new(&location.path);
        cmd.args(command_line.tokens());
        cmd
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Set an environment variable; later values replace earlier ones
    pub fn env<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.env
            .insert(key.as_ref().to_owned(), val.as_ref().to_owned());
        self
    }

    /// Set multiple environment variables
    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (key, val) in vars {
            self.env(key, val);
        }
        self
    }

    /// Set the working directory for the command
    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }

    /// Get the program path
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get the environment overrides
    pub fn get_envs(&self) -> &IndexMap<OsString, OsString> {
        &self.env
    }

    /// Get the current directory
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Convert to an `async_process::Command`
    ///
    /// The program is invoked directly with discrete arguments. The inherited
    /// environment is kept and the overrides are applied on top of it.
    pub fn prepare(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.program);
        cmd.args(&self.args);
        for (key, val) in &self.env {
            cmd.env(key, val);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{LauncherKind, ResolutionSource};
    use crate::spec::ExecutionSpec;

    #[test]
    fn test_for_launcher_keeps_token_boundaries() {
        let location = ExecutableLocation {
            path: PathBuf::from("/opt/maven/bin/mvn"),
            kind: LauncherKind::PosixScript,
            source: ResolutionSource::Explicit,
        };
        let spec = ExecutionSpec::builder()
            .goal("install")
            .unwrap()
            .define("msg", "two words")
            .unwrap()
            .build();

        let cmd = Command::for_launcher(&location, &spec.command_line().unwrap());
        assert_eq!(cmd.get_program(), Path::new("/opt/maven/bin/mvn"));
        assert_eq!(cmd.get_args(), ["-Dmsg=two words", "install"]);
    }

    #[test]
    fn test_env_override_replaces_value() {
        let mut cmd = Command::new("mvn");
        cmd.env("MAVEN_OPTS", "-Xmx1g")
            .envs([("A", "1"), ("MAVEN_OPTS", "-Xmx2g")])
            .current_dir("/tmp");

        assert_eq!(cmd.get_envs().len(), 2);
        assert_eq!(
            cmd.get_envs().get(OsStr::new("MAVEN_OPTS")),
            Some(&OsString::from("-Xmx2g"))
        );
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp")));
    }
}
