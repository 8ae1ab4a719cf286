//! wikifs command-line host.
//!
//! Drives the wiki verb set against workspaces listed in a config file.
//!
//! Usage:
//!   wikifs ls wiki:///
//!   echo '# Hello' | wikifs write wiki://notes/hello
//!   wikifs cat wiki://notes/hello
//!   wikifs mv wiki:///drafts/a wiki:///published/a
//!   wikifs --json stat wiki:///published
//!
//! Config is read from `--config`, `$WIKIFS_CONFIG`, or `./wikifs.toml`;
//! without one the current directory is the only workspace.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wikifs_kernel::{Router, WikiConfig};

use crate::commands::Command;

/// Default config file looked up in the current directory.
const DEFAULT_CONFIG: &str = "wikifs.toml";

/// Markdown wiki as a virtual filesystem.
#[derive(Parser, Debug)]
#[command(name = "wikifs")]
#[command(about = "Read and edit a workspace wiki through wiki:// URIs")]
struct Args {
    /// Config file listing workspaces
    #[arg(short, long, env = "WIKIFS_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

fn load_config(explicit: Option<PathBuf>) -> Result<WikiConfig> {
    if let Some(path) = explicit {
        return WikiConfig::load(&path).with_context(|| format!("loading {}", path.display()));
    }

    let default = PathBuf::from(DEFAULT_CONFIG);
    if default.is_file() {
        return WikiConfig::load(&default).with_context(|| format!("loading {DEFAULT_CONFIG}"));
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    tracing::debug!(cwd = %cwd.display(), "no config file, using current directory");
    Ok(WikiConfig::for_directory(cwd))
}

async fn run_cli(args: Args) -> Result<()> {
    let config = load_config(args.config)?;
    let router = Router::new(config.host().context("building workspace list")?);
    let mut stdout = std::io::stdout().lock();
    commands::run(&router, args.command, args.json, &mut std::io::stdin(), &mut stdout).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let result = run_cli(args).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wikifs: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_json_after_subcommand() {
        let args = Args::try_parse_from(["wikifs", "ls", "wiki:///", "--json"]).unwrap();
        assert!(args.json);
        assert!(matches!(args.command, Command::Ls { .. }));
    }

    #[test]
    fn test_parse_write_flags() {
        let args = Args::try_parse_from([
            "wikifs",
            "--config",
            "x.toml",
            "write",
            "--no-overwrite",
            "wiki:///a",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        match args.command {
            Command::Write {
                no_create,
                no_overwrite,
                ..
            } => {
                assert!(!no_create);
                assert!(no_overwrite);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
