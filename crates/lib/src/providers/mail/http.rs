use super::{Email, MailError, Mailer};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use std::fmt::{self, Debug};
use std::time::Duration;
use tracing::debug;

// --- Transactional mail API request structures ---

#[derive(Serialize)]
struct MailRequest<'a> {
    from: Sender<'a>,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Serialize)]
struct Sender<'a> {
    email: &'a str,
    name: &'a str,
}

// --- HTTP Mailer implementation ---

/// How long a single mail API call may take before it is abandoned.
pub const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers email through a JSON transactional-mail HTTP API.
#[derive(Clone)]
pub struct HttpMailer {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    from_address: String,
    from_name: String,
}

impl HttpMailer {
    /// Creates a new `HttpMailer` with [`DEFAULT_MAIL_TIMEOUT`].
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        from_address: String,
        from_name: String,
    ) -> Result<Self, MailError> {
        Self::with_timeout(api_url, api_key, from_address, from_name, DEFAULT_MAIL_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: String,
        api_key: Option<String>,
        from_address: String,
        from_name: String,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(MailError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from_address,
            from_name,
        })
    }
}

impl Debug for HttpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMailer")
            .field("api_url", &self.api_url)
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let body = MailRequest {
            from: Sender {
                email: &self.from_address,
                name: &self.from_name,
            },
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        debug!(to = %email.to, "--> Sending email through mail API");
        let response = request_builder
            .json(&body)
            .send()
            .await
            .map_err(MailError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
