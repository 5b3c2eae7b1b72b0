use anyhow::{Context, Result};
use maven_exec_config::parser;
use std::path::Path;

pub fn run(config_path: &Path, name: &str) -> Result<()> {
    let file = parser::parse_file(config_path).context("Failed to parse task file")?;
    let identity = file.task(name)?.identity()?;
    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}
