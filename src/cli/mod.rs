//! CLI module - Command-line interface for the accounts service
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Accounts - email-keyed account and token service
#[derive(Parser)]
#[command(name = "accounts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "web")]
    Serve,

    /// Create an account with staff and superuser rights
    CreateSuperuser {
        /// Login email
        #[arg(long)]
        email: String,
        /// Initial password
        #[arg(long)]
        password: String,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },

    /// List all accounts, or look one up by email
    #[command(alias = "ls")]
    ListAccounts {
        /// Show only the account with this email
        #[arg(long)]
        email: Option<String>,
    },

    /// Block until the database accepts connections
    WaitForDb {
        /// Number of connection attempts before giving up
        #[arg(long, default_value = "30")]
        attempts: u32,
        /// Delay between attempts in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
