pub mod http;
pub mod log;

pub use self::http::HttpMailer;
pub use self::log::LogMailer;

use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to the mail API: {0}")]
    Request(reqwest::Error),
    #[error("Mail API returned an error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// A trait for delivering platform emails.
///
/// Delivery is always best-effort from the caller's point of view: the
/// approval workflow logs a failed send and carries on.
#[async_trait]
pub trait Mailer: Send + Sync + Debug + DynClone {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

dyn_clone::clone_trait_object!(Mailer);
