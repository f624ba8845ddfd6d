//! statement-insight: classify bank statement PDFs and compare spending
//! across months.
//!
//! Usage:
//!   statement-insight analyze jan.pdf feb.pdf   Per-statement totals and categories
//!   statement-insight compare jan.pdf feb.pdf   Category matrix with trend comments
//!   statement-insight watch [DIR]               Process PDFs dropped into a folder
//!   statement-insight rules                     Show the active keyword table
//!   statement-insight init-config               Write a default config file

mod commands;
mod config;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "statement-insight", version, about = "Bank statement classification and comparison")]
struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "STATEMENT_INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, classify and summarize each statement
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Compare category spending across statements, oldest first
    Compare {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
        /// Skip the per-category trend comments
        #[arg(long)]
        no_comments: bool,
    },
    /// Watch a folder and process new statement PDFs as they arrive
    Watch {
        /// Folder to watch (defaults to intake.dir from config)
        dir: Option<PathBuf>,
    },
    /// Print the keyword rules in precedence order
    Rules,
    /// Write a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose. Logs go to stderr so --json output stays clean.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config_path = config::resolve_path(cli.config.as_deref())?;
    if let Commands::InitConfig = cli.command {
        return commands::cmd_init_config(&config_path);
    }
    let cfg = config::load_config(&config_path)?;

    match cli.command {
        Commands::Analyze { files, json } => commands::cmd_analyze(&cfg, &files, json).await,
        Commands::Compare {
            files,
            json,
            no_comments,
        } => commands::cmd_compare(&cfg, &files, json, no_comments).await,
        Commands::Watch { dir } => commands::cmd_watch(&cfg, dir).await,
        Commands::Rules => commands::cmd_rules(&cfg),
        Commands::InitConfig => commands::cmd_init_config(&config_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_compare_flags() {
        let cli = Cli::try_parse_from(["statement-insight", "compare", "a.pdf", "b.pdf", "--json", "--no-comments"]).unwrap();
        match cli.command {
            Commands::Compare { files, json, no_comments } => {
                assert_eq!(files.len(), 2);
                assert!(json && no_comments);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn analyze_requires_files() {
        assert!(Cli::try_parse_from(["statement-insight", "analyze"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["statement-insight", "rules", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
