//! Run Maven from a declarative description
//!
//! This crate turns an [`ExecutionSpec`] (goals, profiles, properties and
//! flags) into a deterministic [`CommandLine`], finds the platform's Maven
//! launcher, and runs it as a supervised child process with streamed output,
//! timeouts and cancellation.
//!
//! ```no_run
//! use maven_exec::{CancellationToken, ExecutableResolver, ExecutionSpec, MavenExecutor};
//!
//! # fn main() -> maven_exec::Result<()> {
//! let spec = ExecutionSpec::builder()
//!     .goals(["clean", "install"])?
//!     .profile("ci")?
//!     .define("skipTests", "true")?
//!     .batch_mode(true)
//!     .build();
//!
//! let executor = MavenExecutor::local(ExecutableResolver::default());
//! let result = executor.execute(&spec, &CancellationToken::new())?;
//! println!("finished in {:?}", result.duration);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backends;
pub mod cancel;
pub mod command;
pub mod command_line;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod executor;
pub mod launcher;
pub mod process;
pub mod resolver;
pub mod spec;
pub mod task;

pub use backends::LocalLauncher;
pub use cancel::CancellationToken;
pub use command::Command;
pub use command_line::CommandLine;
pub use descriptor::MavenDescriptor;
pub use error::{Error, Result};
pub use event::{LogSource, NullSink, OutputSink, OutputTail, ProcessEvent, ProcessEventType, TracingSink};
pub use executor::{ExecOptions, MavenExecutor};
pub use launcher::Launcher;
pub use process::{ExitStatus, ProcessHandle, ProcessResult};
pub use resolver::{
    Environment, ExecutableLocation, ExecutableResolver, LauncherKind, MapEnvironment, Platform,
    ResolutionSource, SystemEnvironment,
};
pub use spec::{ChecksumPolicy, ColorMode, ExecutionSpec, ExecutionSpecBuilder, FailMode};
pub use task::{Execute, MavenTask, TaskIdentity};
