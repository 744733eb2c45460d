//! # Fletia
//!
//! Domain logic for the Fletia freight marketplace: clients post shipment
//! requests, verified carriers (`transportistas`) fulfil them, and
//! administrators approve carrier applications.
//!
//! Every operation takes a [`SqliteProvider`] and, where the caller matters,
//! the acting [`Usuario`]. Transports (the HTTP server, the CLI) translate
//! [`MarketError`] into their own error shapes through [`MarketError::kind`].

pub mod approval;
pub mod carriers;
pub mod chat;
pub mod constants;
pub mod dashboard;
pub mod errors;
pub mod geo;
pub mod providers;
pub mod requests;

pub use approval::{approve_carrier, approval_email, reject_carrier, Aprobacion};
pub use chat::ChatHub;
pub use errors::{ErrorKind, MarketError};
pub use fletia_access as access;
pub use fletia_access::{Rol, Usuario};
pub use providers::db::sqlite::SqliteProvider;
pub use providers::mail::{Email, HttpMailer, LogMailer, MailError, Mailer};

use std::path::Path;
use tracing::info;

/// Opens the database at `db_path` and makes sure every table exists.
pub async fn open_database(db_path: &str) -> Result<SqliteProvider, MarketError> {
    // Ensure the db directory exists before trying to create the database.
    if db_path != ":memory:" {
        if let Some(parent) = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }
    let provider = SqliteProvider::new(db_path).await?;
    provider.initialize_schema().await?;
    info!(db_path, "Database ready");
    Ok(provider)
}
