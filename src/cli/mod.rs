//! CLI module - Command-line interface for tokenvault
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Args, Parser, Subcommand};

/// tokenvault - user registration and access-token store
#[derive(Parser)]
#[command(name = "tokenvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Register a new user
    #[command(alias = "add")]
    AddUser(AddUserArgs),

    /// Mark the account holding a linked-account activation token as activated
    Activate {
        /// Activation token
        token: String,
    },

    /// Issue a new access token for a user
    #[command(alias = "issue")]
    IssueToken {
        /// User ID
        user_id: String,
    },

    /// Check an access token and print its owner
    #[command(alias = "verify")]
    VerifyToken {
        /// Access token
        token: String,
    },

    /// Remove a user's expired access tokens
    PurgeTokens {
        /// User ID
        user_id: String,
    },

    /// Show a user by ID or username
    #[command(alias = "show")]
    ShowUser {
        /// User ID or username
        user: String,
        /// Print the user as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a username and password
    Login {
        username: String,
        password: String,
    },
}

#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Username (a temporary one is generated when omitted)
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// External account ID to link
    #[arg(long)]
    pub account_id: Option<String>,

    /// Provider tag of the linked account
    #[arg(long, default_value = "fb")]
    pub account_type: String,

    #[arg(long, requires = "account_id")]
    pub first_name: Option<String>,

    #[arg(long, requires = "account_id")]
    pub last_name: Option<String>,

    /// Activation token stored on the linked account
    #[arg(long, requires = "account_id")]
    pub activation_token: Option<String>,
}

pub use commands::*;
