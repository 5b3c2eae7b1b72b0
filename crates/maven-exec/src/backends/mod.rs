//! Launcher implementations
//!
//! Only local processes are supported. Other launchers, such as fakes used in
//! tests, implement [`Launcher`](crate::launcher::Launcher) directly.

pub mod local;
pub use local::{LocalLauncher, LocalProcessHandle, ProcessEventStream};
