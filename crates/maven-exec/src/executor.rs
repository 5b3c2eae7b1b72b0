//! Running Maven: spawn, stream, supervise

use async_io::Timer;
use futures::StreamExt;
use futures::future::Either;
use futures_lite::future;
use indexmap::IndexMap;
use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::backends::local::LocalLauncher;
use crate::cancel::CancellationToken;
use crate::command::Command;
use crate::command_line::CommandLine;
use crate::error::{Error, Result};
use crate::event::{OutputSink, OutputTail, TracingSink};
use crate::launcher::Launcher;
use crate::process::{ExitStatus, ProcessHandle, ProcessResult};
use crate::resolver::ExecutableResolver;
use crate::spec::ExecutionSpec;

/// Default time a terminated child gets to exit before it is killed
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Default number of output lines kept for diagnostics
pub const DEFAULT_TAIL_LINES: usize = 200;

/// How long output is still read once the child has exited
///
/// A background process started by Maven can inherit the pipes and keep
/// them open long after Maven itself is gone.
pub const OUTPUT_DRAIN_WINDOW: Duration = Duration::from_millis(500);

/// Supervision settings shared by every invocation of an executor
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Stop the child when it runs longer than this
    pub timeout: Option<Duration>,
    /// Time between the termination signal and a forced kill
    pub grace_period: Duration,
    /// Output lines kept for error reports
    pub tail_lines: usize,
    /// Variables added to every child's environment
    pub env: IndexMap<String, String>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            grace_period: DEFAULT_GRACE_PERIOD,
            tail_lines: DEFAULT_TAIL_LINES,
            env: IndexMap::new(),
        }
    }
}

/// Why a running child is being stopped
#[derive(Debug, Clone, Copy)]
enum Interrupt {
    TimedOut(Duration),
    Cancelled,
}

impl Interrupt {
    fn into_error(self) -> Error {
        match self {
            Interrupt::TimedOut(after) => Error::Timeout { after },
            Interrupt::Cancelled => Error::Cancelled,
        }
    }
}

enum Outcome {
    Exited(Result<ExitStatus>),
    Interrupted(Interrupt),
}

/// Runs Maven invocations through a [`Launcher`]
///
/// Each call owns its own process, pipes and timers, so one executor can be
/// shared by several threads running different specs.
pub struct MavenExecutor<L: Launcher = LocalLauncher> {
    label: String,
    launcher: L,
    resolver: ExecutableResolver,
    options: ExecOptions,
    sink: Arc<dyn OutputSink>,
}

impl<L: Launcher> fmt::Debug for MavenExecutor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MavenExecutor")
            .field("label", &self.label)
            .field("resolver", &self.resolver)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MavenExecutor<LocalLauncher> {
    /// Create an executor spawning local processes
    pub fn local(resolver: ExecutableResolver) -> Self {
        Self::new(LocalLauncher, resolver)
    }
}

impl<L: Launcher> MavenExecutor<L> {
    /// Create an executor with the given launcher and resolver
    pub fn new(launcher: L, resolver: ExecutableResolver) -> Self {
        Self {
            label: "maven".to_string(),
            launcher,
            resolver,
            options: ExecOptions::default(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Name attached to log lines
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace all supervision settings
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop invocations that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Time allowed between the termination signal and a forced kill
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.options.grace_period = grace_period;
        self
    }

    /// Send output lines to `sink` instead of `tracing`
    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Add a variable to every child's environment
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// The label used in log lines
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The resolver used to find the launcher
    pub fn resolver(&self) -> &ExecutableResolver {
        &self.resolver
    }

    /// The supervision settings
    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    /// Validate the spec, resolve the launcher and assemble the command
    ///
    /// This is everything that happens before a spawn; it has no side
    /// effects beyond reading the filesystem and environment.
    pub fn prepare(&self, spec: &ExecutionSpec) -> Result<Command> {
        let command_line = CommandLine::build(spec)?;
        let location = self.resolver.resolve_in(spec.working_dir())?;
        debug!(
            task = %self.label,
            launcher = %location.path.display(),
            source = ?location.source,
            "resolved maven launcher"
        );

        let mut command = Command::for_launcher(&location, &command_line);
        command.envs(&self.options.env);
        command.envs(spec.env());
        if let Some(dir) = spec.working_dir() {
            command.current_dir(dir);
        }
        Ok(command)
    }

    /// Run a spec to completion, blocking the calling thread
    pub fn execute(&self, spec: &ExecutionSpec, cancel: &CancellationToken) -> Result<ProcessResult> {
        future::block_on(self.run(spec, cancel))
    }

    /// Run a spec to completion
    ///
    /// Configuration and resolution errors are returned before anything is
    /// spawned. A non-zero exit, a timeout or a cancellation each end the
    /// invocation with an error; nothing is retried.
    pub async fn run(&self, spec: &ExecutionSpec, cancel: &CancellationToken) -> Result<ProcessResult> {
        let command = self.prepare(spec)?;
        self.run_command(command, cancel).await
    }

    /// Run an already prepared command under this executor's supervision
    pub async fn run_command(
        &self,
        command: Command,
        cancel: &CancellationToken,
    ) -> Result<ProcessResult> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        info!(
            task = %self.label,
            program = %command.get_program().display(),
            args = ?command.get_args(),
            "starting maven"
        );
        let started = Instant::now();
        let (mut events, mut handle) = self.launcher.launch(command).await?;
        let mut tail = OutputTail::new(self.options.tail_lines);

        let outcome = {
            // The event stream polls stdout and stderr together, so neither
            // pipe can fill up while the other is being read.
            let completion = async {
                let drain = pin!(async {
                    while let Some(event) = events.next().await {
                        if let Some((source, line)) = event.line() {
                            self.sink.line(&self.label, source, line);
                            tail.push(line);
                        }
                    }
                });
                let exit = pin!(handle.wait());

                let status = match futures::future::select(drain, exit).await {
                    Either::Left(((), exit)) => exit.await,
                    Either::Right((status, drain)) => {
                        let drained = future::or(async { drain.await; true }, async {
                            Timer::after(OUTPUT_DRAIN_WINDOW).await;
                            false
                        })
                        .await;
                        if !drained {
                            debug!(task = %self.label, "output still open after exit, closing pipes");
                        }
                        status
                    }
                };
                Outcome::Exited(status)
            };
            let interruption = async {
                Outcome::Interrupted(interrupted(self.options.timeout, cancel).await)
            };
            future::or(completion, interruption).await
        };
        let duration = started.elapsed();
        // Closes the pipes even if a background process still holds them
        drop(events);

        match outcome {
            Outcome::Exited(status) => self.finish(status?, tail, duration),
            Outcome::Interrupted(reason) => {
                warn!(task = %self.label, reason = ?reason, "stopping maven");
                match self.shutdown(&mut handle).await {
                    Ok(status) => debug!(task = %self.label, status = ?status, "maven stopped"),
                    Err(e) => warn!(task = %self.label, error = %e, "failed to stop maven cleanly"),
                }
                Err(reason.into_error())
            }
        }
    }

    fn finish(&self, status: ExitStatus, tail: OutputTail, duration: Duration) -> Result<ProcessResult> {
        match (status.code, status.signal) {
            (Some(0), _) => {
                info!(task = %self.label, duration = ?duration, lines = tail.total_lines(), "maven finished");
                Ok(ProcessResult {
                    exit_code: 0,
                    duration,
                    tail,
                })
            }
            (Some(exit_code), _) => {
                warn!(task = %self.label, exit_code, duration = ?duration, "maven failed");
                Err(Error::ExecutionFailed {
                    exit_code,
                    tail: tail.into_lines(),
                })
            }
            (None, signal) => {
                let signal = signal.unwrap_or(-1);
                warn!(task = %self.label, signal, "maven killed by signal");
                Err(Error::SignalTerminated {
                    signal,
                    tail: tail.into_lines(),
                })
            }
        }
    }

    /// Terminate, wait out the grace period, then kill
    async fn shutdown(&self, handle: &mut L::Handle) -> Result<ExitStatus> {
        handle.terminate().await?;

        let grace = self.options.grace_period;
        let exited = future::or(async { Some(handle.wait().await) }, async {
            Timer::after(grace).await;
            None
        })
        .await;

        match exited {
            Some(Ok(status)) => Ok(status),
            Some(Err(e)) => {
                handle.kill().await?;
                Err(e)
            }
            None => {
                warn!(task = %self.label, grace = ?grace, "maven ignored termination, killing");
                handle.kill().await?;
                handle.wait().await
            }
        }
    }
}

async fn interrupted(timeout: Option<Duration>, cancel: &CancellationToken) -> Interrupt {
    let cancelled = async {
        cancel.cancelled().await;
        Interrupt::Cancelled
    };
    match timeout {
        Some(after) => {
            future::or(cancelled, async move {
                Timer::after(after).await;
                Interrupt::TimedOut(after)
            })
            .await
        }
        None => cancelled.await,
    }
}
