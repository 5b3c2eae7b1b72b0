use anyhow::{Context, Result};
use maven_exec::{ExecutableResolver, MavenDescriptor, MavenExecutor, NullSink, ResolutionSource};
use maven_exec_config::parser;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    // Without a task file the launcher is looked up the default way
    let (executor, dir) = if config_path.exists() {
        let file = parser::parse_file(config_path).context("Failed to parse task file")?;
        (file.executor(), file.base_dir.clone())
    } else {
        let dir = std::env::current_dir().context("Failed to read working directory")?;
        (MavenExecutor::local(ExecutableResolver::default()), Some(dir))
    };

    let descriptor = MavenDescriptor::probe(&executor.with_sink(NullSink), dir.as_deref())?;
    let source = match &descriptor.location.source {
        ResolutionSource::Explicit => "configured path".to_string(),
        ResolutionSource::Wrapper => "maven wrapper".to_string(),
        ResolutionSource::HomeVariable(var) => format!("${var}"),
        ResolutionSource::Path => "PATH".to_string(),
    };

    println!("Apache Maven {}", descriptor.version);
    println!("  Launcher: {}", descriptor.location.path.display());
    println!("  Found via: {source}");
    Ok(())
}
