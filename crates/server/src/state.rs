//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup: the database, the mailer, the chat hub and the
//! bootstrap administrator.

use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use fletia::{
    access, open_database, ChatHub, HttpMailer, LogMailer, Mailer, SqliteProvider,
};
use std::sync::Arc;
use tracing::{info, warn};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The marketplace database.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// Delivers carrier credentials. Logs instead when no mail API is set.
    pub mailer: Arc<dyn Mailer>,
    /// Live chat fan-out for the server-sent event streams.
    pub chat_hub: ChatHub,
}

/// Picks the mailer for the configuration.
pub fn build_mailer(config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match config.mail_api() {
        Some(mail) => {
            info!(api_url = %mail.api_url, "Using HTTP mail API.");
            let mailer = HttpMailer::new(
                mail.api_url.clone(),
                mail.api_key.clone().filter(|k| !k.is_empty()),
                mail.from_address.clone(),
                mail.from_name.clone(),
            )?;
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("No mail API configured. Approval emails will only be logged.");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Builds the shared application state from the configuration.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let sqlite_provider = open_database(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized marketplace storage (SQLite).");

    if config.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("JWT_SECRET is not set; using the built-in development secret.");
    }

    if let Some(admin) = config.admin_bootstrap() {
        let usuario =
            access::ensure_admin(&sqlite_provider.db, &admin.email, &admin.password, &admin.nombre)
                .await?;
        info!(uid = %usuario.uid, email = %usuario.email, "Administrator account is ready.");
    }

    let mailer = build_mailer(&config)?;

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        mailer,
        chat_hub: ChatHub::default(),
    })
}
