use anyhow::{Context, Result, bail};
use maven_exec::{CancellationToken, Error};
use maven_exec_config::parser;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

pub fn run(config_path: &Path, names: &[String], timeout: Option<u64>) -> Result<()> {
    let file = parser::parse_file(config_path).context("Failed to parse task file")?;

    // Resolve every requested task up front so a typo fails before anything runs
    let tasks = names
        .iter()
        .map(|name| file.task(name))
        .collect::<Result<Vec<_>, _>>()?;

    let cancel = CancellationToken::new();
    install_signal_handlers(&cancel)?;

    for task in &tasks {
        let mut executor = file.executor().with_label(task.name());
        if let Some(secs) = timeout {
            executor = executor.with_timeout(Duration::from_secs(secs));
        }

        println!("▶ {}: mvn {}", task.name(), task.command_line()?);
        match task.run(&executor, &cancel) {
            Ok(result) => {
                println!("✓ {} ({:.1}s)", task.name(), result.duration.as_secs_f64());
            }
            Err(Error::Cancelled) => bail!("interrupted while running '{}'", task.name()),
            Err(e) => {
                error!(task = %task.name(), "{e}");
                for line in e.output_tail() {
                    eprintln!("  {line}");
                }
                bail!("task '{}' failed", task.name());
            }
        }
    }

    info!(tasks = tasks.len(), "all tasks finished");
    Ok(())
}

/// Cancel the running task on SIGINT or SIGTERM
#[cfg(unix)]
fn install_signal_handlers(cancel: &CancellationToken) -> Result<()> {
    use signal_hook::{
        consts::{SIGINT, SIGTERM},
        iterator::Signals,
    };
    use std::thread;
    use tracing::warn;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handler")?;
    let cancel = cancel.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            warn!(signal = sig, "received signal, stopping maven");
            cancel.cancel();
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn install_signal_handlers(_cancel: &CancellationToken) -> Result<()> {
    Ok(())
}
