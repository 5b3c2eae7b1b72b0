//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use maven_exec::{
    Command, ExecutableResolver, Launcher, LogSource, MapEnvironment, MavenExecutor,
    OutputSink, Platform, Result,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Write an executable `bin/mvn` shell script under `home`
#[cfg(unix)]
pub fn fake_maven(home: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = home.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let path = bin.join("mvn");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A resolver that only knows `MAVEN_HOME=home`
pub fn resolver_for(home: &Path) -> ExecutableResolver {
    ExecutableResolver::new(Platform::current())
        .environment(MapEnvironment::new().with("MAVEN_HOME", home.as_os_str()))
}

/// A local executor using the fake installation at `home`
pub fn executor_for(home: &Path) -> MavenExecutor {
    MavenExecutor::local(resolver_for(home)).with_label("test")
}

/// Collects every output line
#[derive(Clone, Default)]
pub struct CollectingSink {
    lines: Arc<Mutex<Vec<(LogSource, String)>>>,
}

impl CollectingSink {
    pub fn lines(&self) -> Vec<(LogSource, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn stdout(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(source, _)| *source == LogSource::Stdout)
            .map(|(_, line)| line)
            .collect()
    }
}

impl OutputSink for CollectingSink {
    fn line(&self, _label: &str, source: LogSource, line: &str) {
        self.lines.lock().unwrap().push((source, line.to_string()));
    }
}

/// Wraps another launcher and counts launch attempts
pub struct RecordingLauncher<L> {
    inner: L,
    launches: Arc<AtomicUsize>,
}

impl<L> RecordingLauncher<L> {
    pub fn new(inner: L) -> (Self, Arc<AtomicUsize>) {
        let launches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                launches: launches.clone(),
            },
            launches,
        )
    }
}

#[async_trait]
impl<L: Launcher> Launcher for RecordingLauncher<L> {
    type EventStream = L::EventStream;
    type Handle = L::Handle;

    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.inner.launch(command).await
    }
}
