use anyhow::{Context, Result};
use maven_exec_config::parser;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    println!("Validating {}...", config_path.display());

    // Every task is checked against the builder during parsing
    let file = parser::parse_file(config_path).context("Failed to parse task file")?;

    println!("✓ Task file valid");
    println!("  Version: {}", file.version);
    if let Some(home) = &file.maven.home {
        println!("  Maven: {}", home.display());
    }
    if file.maven.wrapper {
        println!("  Wrapper: preferred");
    }
    println!("  Tasks: {}", file.tasks.len());

    for task in file.all_tasks()? {
        println!("  {}: mvn {}", task.name(), task.command_line()?);
    }

    Ok(())
}
