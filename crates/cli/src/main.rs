//! # fletia-cli: operator commands for a Fletia database
//!
//! Bootstraps administrators and works the carrier approval queue without
//! going through the HTTP server. Uses the same workflows as the server.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fletia::constants::{DEFAULT_DB_FILE, PLATFORM_NAME};
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the marketplace database.
    #[arg(long, global = true, env = "DB_URL", default_value = DEFAULT_DB_FILE)]
    db: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an administrator account, or promote an existing one
    CreateAdmin(CreateAdminArgs),
    /// List carrier applications waiting for review
    Pending,
    /// Approve a carrier and email their credentials
    Approve(ApproveArgs),
    /// Reject a carrier application
    Reject(RejectArgs),
}

#[derive(Args, Debug)]
pub struct CreateAdminArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "FLETIA_ADMIN_PASSWORD")]
    pub password: String,
    #[arg(long, default_value = "Administrador")]
    pub nombre: String,
}

/// Mail API settings. Without an API URL the credentials email is only logged.
#[derive(Args, Debug)]
pub struct MailArgs {
    #[arg(long, env = "FLETIA_MAIL_API_URL")]
    pub mail_api_url: Option<String>,
    #[arg(long, env = "FLETIA_MAIL_API_KEY", hide_env_values = true)]
    pub mail_api_key: Option<String>,
    #[arg(long, env = "FLETIA_MAIL_FROM_ADDRESS", default_value = "no-reply@fletia.hn")]
    pub mail_from_address: String,
    #[arg(long, env = "FLETIA_MAIL_FROM_NAME", default_value = PLATFORM_NAME)]
    pub mail_from_name: String,
}

#[derive(Args, Debug)]
pub struct ApproveArgs {
    /// The carrier profile id
    pub id: String,
    #[command(flatten)]
    pub mail: MailArgs,
}

#[derive(Args, Debug)]
pub struct RejectArgs {
    /// The carrier profile id
    pub id: String,
    /// Reason shown to the applicant
    #[arg(long)]
    pub motivo: Option<String>,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output on stdout stays clean.
    let subscriber = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let db = fletia::open_database(&cli.db).await?;

    match cli.command {
        Commands::CreateAdmin(args) => commands::handle_create_admin(&db, &args).await,
        Commands::Pending => commands::handle_pending(&db).await,
        Commands::Approve(args) => commands::handle_approve(&db, &args).await,
        Commands::Reject(args) => commands::handle_reject(&db, &args).await,
    }
}
