//! Launcher trait: the seam between the executor and real processes

use crate::command::Command;
use crate::error::Result;
use crate::event::ProcessEvent;
use crate::process::ProcessHandle;
use async_trait::async_trait;
use futures::stream::Stream;

/// Something that can start a prepared [`Command`]
///
/// [`LocalLauncher`](crate::backends::local::LocalLauncher) spawns real
/// processes. Tests substitute launchers that record or script their calls.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// The event stream type this launcher produces
    type EventStream: Stream<Item = ProcessEvent> + Send + Unpin;

    /// The process handle type this launcher produces
    type Handle: ProcessHandle;

    /// Launch a command, returning its output events and a control handle
    ///
    /// The event stream ends once both output pipes are closed.
    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)>;
}
