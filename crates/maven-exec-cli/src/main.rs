//! `mvnexec`: run Maven tasks declared in a YAML task file

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;

#[derive(Parser)]
#[command(name = "mvnexec")]
#[command(about = "Run Maven tasks from a declarative task file")]
#[command(version)]
struct Cli {
    /// Task file path
    #[arg(short, long, global = true, default_value = "maven.yaml")]
    config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the task file and print each task's command line
    Validate,

    /// Print a task's identity as JSON
    Show {
        /// Task to describe
        task: String,
    },

    /// Run tasks in order, stopping at the first failure
    Run {
        /// Tasks to run
        #[arg(required = true)]
        tasks: Vec<String>,

        /// Override the task file timeout, in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Resolve the Maven launcher and print its version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Logs and Maven output go to stderr; stdout carries command results
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate => commands::validate::run(&cli.config),
        Commands::Show { task } => commands::show::run(&cli.config, &task),
        Commands::Run { tasks, timeout } => commands::run::run(&cli.config, &tasks, timeout),
        Commands::Version => commands::version::run(&cli.config),
    }
}
