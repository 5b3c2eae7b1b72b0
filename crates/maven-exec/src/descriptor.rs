//! Facts about a Maven installation

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::cancel::CancellationToken;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::executor::MavenExecutor;
use crate::launcher::Launcher;
use crate::resolver::ExecutableLocation;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Apache Maven (\S+)").expect("version pattern is valid")
});

/// A resolved launcher together with the Maven version it reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenDescriptor {
    /// The launcher that was probed
    pub location: ExecutableLocation,
    /// Version string, e.g. `3.9.6`
    pub version: String,
}

impl MavenDescriptor {
    /// Resolve the launcher and ask it for its version
    ///
    /// `working_dir` is where a Maven wrapper is looked for, and where the
    /// launcher runs.
    pub fn probe<L: Launcher>(
        executor: &MavenExecutor<L>,
        working_dir: Option<&Path>,
    ) -> Result<Self> {
        let location = executor.resolver().resolve_in(working_dir)?;
        let mut command = Command::new(&location.path);
        command.arg("--version");
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let cancel = CancellationToken::new();
        let result = futures_lite::future::block_on(executor.run_command(command, &cancel))?;
        let version =
            parse_version(result.tail.lines()).ok_or_else(|| Error::UnrecognizedVersion {
                launcher: location.path.clone(),
            })?;

        Ok(Self { location, version })
    }
}

/// Extract the version from `mvn --version` output
pub fn parse_version<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines.into_iter().find_map(|line| {
        VERSION_PATTERN
            .captures(line.trim_start())
            .map(|caps| caps[1].to_string())
    })
}
