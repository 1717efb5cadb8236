mod flows;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use seedbed_core::{InitConfig, WorkspaceLayout};

#[derive(Parser, Debug)]
#[command(name = "seedbed")]
#[command(about = "Transactional workspace initializer", long_about = None)]
struct Cli {
    #[arg(long)]
    project_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Init {
        #[arg(long)]
        force: bool,
        #[arg(long)]
        skip_backup: bool,
    },
    Validate {
        #[arg(long)]
        post: bool,
        #[arg(long)]
        config: bool,
        #[arg(long)]
        modes: bool,
    },
    Health,
    Backups,
    Cleanup {
        #[arg(long, default_value_t = 5)]
        keep: usize,
    },
    Rollback {
        #[arg(long)]
        backup: Option<String>,
        #[arg(long)]
        phase: Option<String>,
        #[arg(long)]
        checkpoint: Option<String>,
    },
    Recover {
        failure: String,
    },
    Doctor,
    Completions {
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_root = match cli.project_root {
        Some(project_root) => project_root,
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };
    let layout = WorkspaceLayout::new(project_root);
    let config = InitConfig::default();

    let clean = match cli.command {
        Commands::Init { force, skip_backup } => {
            flows::run_init(&layout, &config, force, skip_backup)?
        }
        Commands::Validate {
            post,
            config: configuration,
            modes,
        } => flows::run_validate(&layout, &config, post, configuration, modes)?,
        Commands::Health => flows::run_health(&layout, &config)?,
        Commands::Backups => flows::run_backups(&layout, &config)?,
        Commands::Cleanup { keep } => flows::run_cleanup(&layout, &config, keep)?,
        Commands::Rollback {
            backup,
            phase,
            checkpoint,
        } => flows::run_rollback(
            &layout,
            &config,
            backup.as_deref(),
            phase.as_deref(),
            checkpoint.as_deref(),
        )?,
        Commands::Recover { failure } => flows::run_recover(&layout, &config, &failure)?,
        Commands::Doctor => flows::run_doctor(&layout, &config)?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            true
        }
    };

    if !clean {
        std::process::exit(1);
    }
    Ok(())
}
