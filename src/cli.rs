//! Command-line interface and configuration.
//!
//! Every option has an environment fallback; with nothing set the tool reads
//! `scripts/service_account.json` and `firestore.rules` from the working
//! directory and talks to the production Google endpoints.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::DEFAULT_DATABASE;
use crate::session::{Endpoints, DEFAULT_FIRESTORE_URL, DEFAULT_IDENTITY_URL, DEFAULT_RULES_URL};

pub const DEFAULT_CREDENTIALS_PATH: &str = "scripts/service_account.json";

#[derive(Debug, Parser)]
#[command(name = "firerules", version)]
#[command(about = "Deploy Firestore security rules and bootstrap the admin account")]
pub struct Cli {
    /// Service account key file
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_CREDENTIALS_PATH,
        env = "FIRERULES_CREDENTIALS"
    )]
    pub credentials: PathBuf,

    /// Rules file to deploy
    #[arg(
        long,
        global = true,
        default_value = crate::deploy::DEFAULT_RULES_PATH,
        env = "FIRERULES_RULES"
    )]
    pub rules: PathBuf,

    /// Target Firestore database
    #[arg(long, global = true, default_value = DEFAULT_DATABASE, env = "FIRERULES_DATABASE")]
    pub database: String,

    /// Firebase Rules API base URL
    #[arg(long, global = true, default_value = DEFAULT_RULES_URL, env = "FIRERULES_RULES_URL")]
    pub rules_url: String,

    /// Identity Toolkit API base URL
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_IDENTITY_URL,
        env = "FIRERULES_IDENTITY_URL"
    )]
    pub identity_url: String,

    /// Firestore API base URL
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_FIRESTORE_URL,
        env = "FIRERULES_FIRESTORE_URL"
    )]
    pub firestore_url: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload the rules file as a new ruleset and activate it (default)
    Deploy,
    /// Show which ruleset the Firestore release currently points at
    Status,
    /// Create the admin account, or reset its password if it exists
    ResetAdmin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "FIRERULES_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Give the admin account `role: admin` in its users/{uid} document
    GrantAdmin {
        #[arg(long)]
        email: String,
    },
}

impl Cli {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            rules: self.rules_url.trim_end_matches('/').to_string(),
            identity: self.identity_url.trim_end_matches('/').to_string(),
            firestore: self.firestore_url.trim_end_matches('/').to_string(),
        }
    }
}
