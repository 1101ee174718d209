//! BookTime CLI - Database migrations and staff accounts.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema and session table)
//! bt-cli migrate
//!
//! # Create a staff account
//! bt-cli staff create -e owner@booktime.domain -p 'long password' -r owner
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `staff create` - Create a staff account with a back-office role

#![cfg_attr(not(test), forbid(unsafe_code))]

use booktime_core::StaffRole;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bt-cli")]
#[command(author, version, about = "BookTime CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a new staff account
    Create {
        /// Staff email address
        #[arg(short, long)]
        email: String,

        /// Initial password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Back-office role (`owner`, `central_office`, `dispatcher`)
        #[arg(short, long, default_value = "dispatcher")]
        role: StaffRole,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Staff { action } => match action {
            StaffAction::Create {
                email,
                password,
                role,
            } => {
                commands::staff::create(&email, &password, role).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_staff_create_parses_role() {
        let cli = Cli::try_parse_from([
            "bt-cli",
            "staff",
            "create",
            "-e",
            "dispatch@booktime.domain",
            "-p",
            "a long password",
            "-r",
            "central_office",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let Commands::Staff {
            action: StaffAction::Create { role, .. },
        } = cli.command
        else {
            panic!("expected staff create");
        };
        assert_eq!(role, StaffRole::CentralOffice);
    }
}
