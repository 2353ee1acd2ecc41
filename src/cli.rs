// CLI module - command-line argument parsing and handlers
//
// Running without a subcommand starts the console demo. Subcommands manage
// the config file:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --path: Show config file path

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use pagetree::config::{Config, VERSION};
use std::io::Write;
use std::path::{Path, PathBuf};

/// pagetree - interactive message pages driven from the terminal
#[derive(Parser)]
#[command(name = "pagetree")]
#[command(version = VERSION)]
#[command(about = "Drive a tree of interactive message pages from the terminal", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/pagetree/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    /// Config file in effect: the `--config` argument or the default path
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Config::config_path)
    }
}

/// Handle CLI subcommands. Returns true if one was handled (exit after).
pub fn handle_command(cli: &Cli) -> Result<bool> {
    let Some(Commands::Config { show, reset, path }) = &cli.command else {
        return Ok(false); // No subcommand, run the demo
    };

    let config_path = cli
        .config_path()
        .context("could not determine config path")?;

    if *path {
        println!("{}", config_path.display());
    } else if *show {
        handle_config_show(&config_path)?;
    } else if *reset {
        handle_config_reset(&config_path)?;
    } else {
        // No flag provided, show help
        println!("Usage: pagetree config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    Ok(true)
}

fn handle_config_show(path: &Path) -> Result<()> {
    let config = Config::load(Some(path))?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if path.exists() {
        println!("# Source: {}", path.display());
    } else {
        println!("# Source: defaults (no config file)");
    }
    Ok(())
}

fn handle_config_reset(path: &Path) -> Result<()> {
    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
        std::fs::remove_file(path)
            .with_context(|| format!("cannot remove {}", path.display()))?;
    }

    Config::write_default(path)?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_flag_before_subcommand() {
        let cli = Cli::parse_from(["pagetree", "--config", "/tmp/p.toml", "config", "--path"]);
        assert_eq!(cli.config_path(), Some(PathBuf::from("/tmp/p.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config { path: true, .. })
        ));
    }

    #[test]
    fn test_no_subcommand_runs_demo() {
        let cli = Cli::parse_from(["pagetree"]);
        assert!(!handle_command(&cli).unwrap());
    }
}
