// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basera - conversation backend for a real-estate marketplace.
//!
//! This is the binary entry point for the Basera service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod tasks;

/// Basera - conversation backend for a real-estate marketplace.
#[derive(Parser, Debug)]
#[command(name = "basera", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Basera service: task scheduler and reply pipeline.
    Serve,
    /// Manage Basera configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Inspect and enqueue scheduled tasks.
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Load the configuration and report validation errors.
    Check,
}

#[derive(Subcommand, Debug)]
enum TaskCommands {
    /// Enqueue a bot reply task for a chat.
    EnqueueReply {
        /// Chat the bot should reply in.
        #[arg(long)]
        chat_id: String,
        /// RFC 3339 time the task becomes due. Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match basera_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            basera_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config { command: ConfigCommands::Check }) => {
            println!(
                "basera: configuration OK (service.name={}, database={})",
                config.service.name, config.storage.database_path
            );
            Ok(())
        }
        Some(Commands::Task { command }) => match command {
            TaskCommands::EnqueueReply { chat_id, at } => {
                tasks::run_enqueue_reply(&config, &chat_id, at.as_deref()).await
            }
        },
        None => {
            println!("basera: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("basera: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = basera_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.service.name, "basera");
    }
}
