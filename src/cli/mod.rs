//! Command-line interface.
//!
//! Every command other than `daemon` runs once against the configured
//! store and exits.

mod commands;

use clap::{Parser, Subcommand};

/// Pokédex - cache-aside Pokémon lookup service
#[derive(Parser)]
#[command(name = "pokedex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server and the expiry reaper
    #[command(alias = "serve", alias = "-d", alias = "--daemon")]
    Daemon,

    /// Look up a Pokémon by id or name
    #[command(alias = "g")]
    Get {
        /// Numeric id or name
        identifier: String,
    },

    /// Show the Pokémon of the day
    #[command(alias = "daily")]
    Random,

    /// Search by name, id or type
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Pre-populate the store from the provider
    Seed {
        /// Seed every id up to the provider maximum instead of the popular list
        #[arg(long)]
        all: bool,
        /// Ids fetched concurrently per batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Pause between batches in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Remove expired rows now
    Reap,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
