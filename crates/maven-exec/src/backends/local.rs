//! Local process execution backend

use async_process::{Child, Stdio};
use async_trait::async_trait;
use futures::stream::Stream;
use futures_lite::io::{AsyncBufReadExt, BufReader, Split};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::event::{ProcessEvent, ProcessEventType};
use crate::launcher::Launcher;
use crate::process::{ExitStatus, ProcessHandle};

/// Launcher for executing processes locally
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLauncher;

/// A handle to control a local process
pub struct LocalProcessHandle {
    /// The underlying child process
    child: Child,
    /// Set once the child has been reaped
    exited: bool,
}

/// Output of a local process, stdout and stderr interleaved as they arrive
pub struct ProcessEventStream {
    stdout: Option<Split<BufReader<async_process::ChildStdout>>>,
    stderr: Option<Split<BufReader<async_process::ChildStderr>>>,
    started_sent: bool,
    stderr_first: bool,
    child_id: u32,
}

#[async_trait]
impl Launcher for LocalLauncher {
    type EventStream = ProcessEventStream;
    type Handle = LocalProcessHandle;

    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)> {
        let mut async_cmd = command.prepare();

        // Maven must never wait on a terminal; output is always streamed
        async_cmd.stdin(Stdio::null());
        async_cmd.stdout(Stdio::piped());
        async_cmd.stderr(Stdio::piped());

        let mut child = async_cmd.spawn().map_err(|e| {
            Error::spawn_failed(format!(
                "failed to spawn {}: {}",
                command.get_program().display(),
                e
            ))
        })?;

        let child_id = child.id();
        debug!(pid = child_id, program = %command.get_program().display(), "spawned process");

        // Raw lines; Maven output is not guaranteed to be UTF-8
        let stdout = child.stdout.take().map(|s| BufReader::new(s).split(b'\n'));
        let stderr = child.stderr.take().map(|s| BufReader::new(s).split(b'\n'));

        let events = ProcessEventStream {
            stdout,
            stderr,
            started_sent: false,
            stderr_first: false,
            child_id,
        };

        let handle = LocalProcessHandle {
            child,
            exited: false,
        };

        Ok((events, handle))
    }
}

impl LocalProcessHandle {
    #[cfg(unix)]
    fn signal(&self, signal: nix::sys::signal::Signal) -> Result<()> {
        use nix::sys::signal;
        use nix::unistd::Pid;

        let pid = Pid::from_raw(self.child.id() as i32);
        match signal::kill(pid, signal) {
            Ok(()) => Ok(()),
            // Already gone; nothing left to stop
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(Error::signal_failed(signal as i32, e.to_string())),
        }
    }
}

#[async_trait]
impl ProcessHandle for LocalProcessHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self
            .child
            .status()
            .await
            .map_err(|e| Error::spawn_failed(format!("failed to wait for process: {}", e)))?;
        self.exited = true;
        Ok(status.into())
    }

    async fn terminate(&mut self) -> Result<()> {
        if self.exited {
            return Ok(());
        }

        #[cfg(unix)]
        {
            self.signal(nix::sys::signal::Signal::SIGTERM)?;
        }

        #[cfg(not(unix))]
        {
            // No graceful equivalent for console scripts on Windows
            self.child
                .kill()
                .map_err(|e| Error::signal_failed(-1, e.to_string()))?;
        }

        Ok(())
    }

    async fn kill(&mut self) -> Result<()> {
        if self.exited {
            return Ok(());
        }

        #[cfg(unix)]
        {
            self.signal(nix::sys::signal::Signal::SIGKILL)?;
        }

        #[cfg(not(unix))]
        {
            self.child
                .kill()
                .map_err(|e| Error::signal_failed(-1, e.to_string()))?;
        }

        Ok(())
    }
}

impl Drop for LocalProcessHandle {
    fn drop(&mut self) {
        if !self.exited {
            // Synchronous kill; the async methods cannot run here
            let _ = self.child.kill();
        }
    }
}

impl ProcessEventStream {
    fn poll_stdout(&mut self, cx: &mut Context<'_>) -> Poll<Option<ProcessEvent>> {
        poll_pipe(&mut self.stdout, ProcessEventType::Stdout, cx)
    }

    fn poll_stderr(&mut self, cx: &mut Context<'_>) -> Poll<Option<ProcessEvent>> {
        poll_pipe(&mut self.stderr, ProcessEventType::Stderr, cx)
    }
}

fn poll_pipe<R>(
    pipe: &mut Option<Split<R>>,
    event_type: ProcessEventType,
    cx: &mut Context<'_>,
) -> Poll<Option<ProcessEvent>>
where
    R: futures_lite::io::AsyncBufRead + Unpin,
{
    let Some(lines) = pipe else {
        return Poll::Ready(None);
    };
    match Pin::new(lines).poll_next(cx) {
        Poll::Ready(Some(Ok(bytes))) => {
            Poll::Ready(Some(ProcessEvent::new_with_data(event_type, decode_line(bytes))))
        }
        Poll::Ready(Some(Err(e))) => {
            warn!(pipe = ?event_type, error = %e, "failed to read process output");
            *pipe = None;
            Poll::Ready(None)
        }
        Poll::Ready(None) => {
            *pipe = None;
            Poll::Ready(None)
        }
        Poll::Pending => Poll::Pending,
    }
}

/// Decode one output line, replacing invalid UTF-8 and dropping a trailing `\r`
fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

impl Stream for ProcessEventStream {
    type Item = ProcessEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        // Send Started event first
        if !this.started_sent {
            this.started_sent = true;
            let event = ProcessEvent::new(ProcessEventType::Started { pid: this.child_id });
            return Poll::Ready(Some(event));
        }

        // Alternate which pipe goes first so a chatty stdout cannot starve stderr
        this.stderr_first = !this.stderr_first;
        let order = if this.stderr_first { [1, 0] } else { [0, 1] };
        for pipe in order {
            let polled = if pipe == 0 {
                this.poll_stdout(cx)
            } else {
                this.poll_stderr(cx)
            };
            if let Poll::Ready(Some(event)) = polled {
                return Poll::Ready(Some(event));
            }
        }

        // If both streams are closed, the stream is exhausted
        if this.stdout.is_none() && this.stderr.is_none() {
            return Poll::Ready(None);
        }

        // Any open pipe returned Pending and registered the waker
        Poll::Pending
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_launch_streams_both_pipes() {
        smol::block_on(async {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg("echo out; echo err >&2");

            let (events, mut handle) = LocalLauncher.launch(cmd).await.unwrap();
            let events: Vec<ProcessEvent> = events.collect().await;

            assert!(matches!(
                events[0].event_type,
                ProcessEventType::Started { .. }
            ));
            assert!(events.iter().any(|e| e.event_type == ProcessEventType::Stdout
                && e.data.as_deref() == Some("out")));
            assert!(events.iter().any(|e| e.event_type == ProcessEventType::Stderr
                && e.data.as_deref() == Some("err")));

            let status = handle.wait().await.unwrap();
            assert!(status.success());
        });
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"[INFO] ok".to_vec()), "[INFO] ok");
        assert_eq!(decode_line(b"crlf\r".to_vec()), "crlf");
        assert_eq!(decode_line(b"caf\xe9".to_vec()), "caf\u{fffd}");
    }

    #[test]
    fn test_invalid_utf8_does_not_close_the_pipe() {
        smol::block_on(async {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg("printf 'caf\\351\\n'; echo after");

            let (events, mut handle) = LocalLauncher.launch(cmd).await.unwrap();
            let lines: Vec<String> = events
                .filter_map(|e| async move { e.data })
                .collect()
                .await;

            assert_eq!(lines, ["caf\u{fffd}", "after"]);
            assert!(handle.wait().await.unwrap().success());
        });
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        smol::block_on(async {
            let cmd = Command::new("/this/command/does/not/exist_12345");
            let result = LocalLauncher.launch(cmd).await;
            assert!(matches!(result, Err(Error::SpawnFailed { .. })));
        });
    }

    #[test]
    fn test_terminate_stops_process() {
        smol::block_on(async {
            let mut cmd = Command::new("sleep");
            cmd.arg("30");

            let (_events, mut handle) = LocalLauncher.launch(cmd).await.unwrap();
            handle.terminate().await.unwrap();
            let status = handle.wait().await.unwrap();
            assert_eq!(status.signal, Some(15));
            assert!(!status.success());

            // Signalling a reaped child is a no-op
            handle.kill().await.unwrap();
        });
    }
}
