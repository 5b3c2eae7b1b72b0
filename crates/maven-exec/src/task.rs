//! Integration surface for incremental build hosts
//!
//! A host sees a Maven invocation through two capabilities: producing its
//! [`CommandLine`] and executing it. [`MavenTask`] adds the declared inputs and
//! outputs so the host can decide on its own whether a run can be skipped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cancel::CancellationToken;
use crate::command_line::CommandLine;
use crate::error::Result;
use crate::executor::MavenExecutor;
use crate::launcher::Launcher;
use crate::process::ProcessResult;
use crate::spec::ExecutionSpec;

/// Something that can run an [`ExecutionSpec`] to completion
pub trait Execute {
    /// Run the spec, blocking until it finishes, fails or is cancelled
    fn execute(&self, spec: &ExecutionSpec, cancel: &CancellationToken) -> Result<ProcessResult>;
}

impl<L: Launcher> Execute for MavenExecutor<L> {
    fn execute(&self, spec: &ExecutionSpec, cancel: &CancellationToken) -> Result<ProcessResult> {
        MavenExecutor::execute(self, spec, cancel)
    }
}

/// The cacheable identity of a task
///
/// Two tasks with equal identities run the same Maven command in the same
/// directory over the same declared files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskIdentity {
    /// Task name
    pub name: String,
    /// The canonical arguments
    pub command_line: CommandLine,
    /// Directory Maven runs in
    pub working_dir: Option<PathBuf>,
    /// Declared input paths
    pub inputs: Vec<PathBuf>,
    /// Declared output paths
    pub outputs: Vec<PathBuf>,
}

impl TaskIdentity {
    /// Stable JSON rendering, suitable as a cache key
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::configuration(e.to_string()))
    }
}

/// A named Maven invocation with declared inputs and outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenTask {
    name: String,
    spec: ExecutionSpec,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
}

impl MavenTask {
    /// Create a task with no declared files
    pub fn new(name: impl Into<String>, spec: ExecutionSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declare an input path
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Declare several input paths
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Declare an output path
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Declare several output paths
    pub fn outputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.outputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The invocation this task runs
    pub fn spec(&self) -> &ExecutionSpec {
        &self.spec
    }

    /// Declared inputs
    pub fn declared_inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Declared outputs
    pub fn declared_outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Working directory of the invocation
    pub fn working_dir(&self) -> Option<&Path> {
        self.spec.working_dir()
    }

    /// The canonical command line
    pub fn command_line(&self) -> Result<CommandLine> {
        self.spec.command_line()
    }

    /// Everything a host needs to decide whether this task is up to date
    pub fn identity(&self) -> Result<TaskIdentity> {
        Ok(TaskIdentity {
            name: self.name.clone(),
            command_line: self.command_line()?,
            working_dir: self.spec.working_dir().map(Path::to_path_buf),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        })
    }

    /// Run the task. The host decides beforehand whether it needs to.
    pub fn run<E: Execute + ?Sized>(
        &self,
        executor: &E,
        cancel: &CancellationToken,
    ) -> Result<ProcessResult> {
        executor.execute(&self.spec, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::event::OutputTail;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records the specs it was asked to run instead of running them
    #[derive(Default)]
    struct RecordingExecutor {
        calls: RefCell<Vec<CommandLine>>,
    }

    impl Execute for RecordingExecutor {
        fn execute(&self, spec: &ExecutionSpec, _cancel: &CancellationToken) -> Result<ProcessResult> {
            self.calls.borrow_mut().push(spec.command_line()?);
            Ok(ProcessResult {
                exit_code: 0,
                duration: Duration::ZERO,
                tail: OutputTail::new(0),
            })
        }
    }

    fn install_task() -> MavenTask {
        let spec = ExecutionSpec::builder()
            .goals(["clean", "install"])
            .unwrap()
            .working_dir("service")
            .build();
        MavenTask::new("install", spec)
            .input("service/pom.xml")
            .inputs(["service/src"])
            .output("service/target")
    }

    #[test]
    fn test_identity_exposes_command_and_files() {
        let identity = install_task().identity().unwrap();
        assert_eq!(identity.command_line.tokens(), ["clean", "install"]);
        assert_eq!(identity.working_dir, Some(PathBuf::from("service")));
        assert_eq!(identity.inputs.len(), 2);
        assert_eq!(identity.outputs, vec![PathBuf::from("service/target")]);
    }

    #[test]
    fn test_identity_is_stable() {
        let a = install_task().identity().unwrap().to_json().unwrap();
        let b = install_task().identity().unwrap().to_json().unwrap();
        assert_eq!(a, b);

        let changed = MavenTask::new(
            "install",
            ExecutionSpec::builder().goal("verify").unwrap().build(),
        );
        assert_ne!(changed.identity().unwrap().to_json().unwrap(), a);
    }

    #[test]
    fn test_identity_requires_goals() {
        let task = MavenTask::new("empty", ExecutionSpec::builder().build());
        assert!(matches!(task.identity(), Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_run_delegates_to_executor() {
        let executor = RecordingExecutor::default();
        let result = install_task()
            .run(&executor, &CancellationToken::new())
            .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(executor.calls.borrow().len(), 1);
    }
}
