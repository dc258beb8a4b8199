//! CLI argument definitions for the `ldm` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conversational assistant for building logical data models.
#[derive(Parser, Debug)]
#[command(name = "ldm", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API server.
    Serve {
        /// Port to listen on.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Address to bind.
        #[arg(long = "host")]
        host: Option<String>,
    },
    /// Chat with the assistant in the terminal.
    Repl {
        /// User id the conversation is stored under.
        #[arg(short = 'u', long = "user")]
        user: Option<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LDM_CONFIG env var > ~/.ldm/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_from(|key| std::env::var(key).ok())
    }

    fn resolve_config_path_from<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("LDM_CONFIG") {
            return PathBuf::from(p);
        }
        match lookup("HOME") {
            Some(home) => PathBuf::from(home).join(".ldm").join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Log filter directive when `RUST_LOG` is unset.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}
