//! Lucky Draw CLI - database migrations and admin account tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! ld-cli migrate
//!
//! # Create the first super admin
//! ld-cli admin create -e root@example.com -n "Root" -r super_admin --password '...'
//!
//! # Reset a password
//! ld-cli admin set-password -e root@example.com --password '...'
//!
//! # Show an admin's effective permissions
//! ld-cli admin permissions -e mod@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ld-cli")]
#[command(author, version, about = "Lucky Draw CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `moderator`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Starting permission map as JSON (role defaults when omitted)
        #[arg(long)]
        permissions: Option<String>,

        /// Initial password
        #[arg(long)]
        password: Option<String>,
    },
    /// Set an admin's password
    SetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(long)]
        password: String,
    },
    /// Print an admin's stored and effective permissions
    Permissions {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                permissions,
                password,
            } => {
                commands::admin::create(
                    &email,
                    &name,
                    &role,
                    permissions.as_deref(),
                    password.as_deref(),
                )
                .await?;
            }
            AdminAction::SetPassword { email, password } => {
                commands::admin::set_password(&email, &password).await?;
            }
            AdminAction::Permissions { email } => {
                commands::admin::permissions(&email).await?;
            }
        },
    }
    Ok(())
}
