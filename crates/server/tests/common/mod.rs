//! # Common Test Utilities
//!
//! This module centralizes the test harness used across the `fletia-server`
//! integration tests:
//!
//! - `TestApp`: spawns a real server on a random port with a temporary SQLite
//!   database, a bootstrap administrator and the mail API pointed at an
//!   `httpmock::MockServer`.
//! - Helpers for signing in, registering accounts and walking a carrier
//!   through approval.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::{anyhow, Result};
use fletia::{access, carriers, Usuario};
use fletia_server::{
    auth::token::Claims,
    config, router,
    state::{build_app_state, AppState},
};
use fletia_test_utils::TEST_PASSWORD;
use axum::serve;
use httpmock::{Method, Mock, MockServer};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::{json, Value};
use std::{
    fs::File,
    io::Write,
    net::SocketAddr,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const ADMIN_EMAIL: &str = "admin@fletia.test";
pub const ADMIN_PASSWORD: &str = "admin-clave";
pub const MAIL_PATH: &str = "/v1/emails";

// --- Full Application Test Harness ---

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: NamedTempFile,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .with_test_writer()
            .try_init();

        let mock_server = MockServer::start();
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
jwt_secret: "{JWT_SECRET}"
token_ttl_hours: 1
admin:
  email: "{ADMIN_EMAIL}"
  password: "{ADMIN_PASSWORD}"
  nombre: "Admin Pruebas"
mail:
  api_url: "{}"
  api_key: "test-mail-key"
  from_address: "no-reply@fletia.test"
"#,
            db_path.display(),
            mock_server.url(MAIL_PATH),
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config_path = config_path
            .to_str()
            .ok_or_else(|| anyhow!("non UTF-8 temp path"))?;
        let config = config::get_config(Some(config_path))?;
        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            db_path,
            app_state: app_state_for_harness,
            _db_file: db_file,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Mocks a healthy mail API.
    pub fn mock_mail_ok(&self) -> Mock<'_> {
        self.mock_server.mock(|when, then| {
            when.method(Method::POST).path(MAIL_PATH);
            then.status(200).json_body(json!({ "id": "email-1" }));
        })
    }

    /// Signs in and returns the session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("login failed with {}", response.status()));
        }
        let body: Value = response.json().await?;
        body["result"]["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("login response without token: {body}"))
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Registers a client account and returns `(token, usuario)`.
    pub async fn register_cliente(&self, email: &str, nombre: &str) -> Result<(String, Value)> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": email,
                "password": TEST_PASSWORD,
                "nombre": nombre,
                "telefono": "9999-0000",
                "rol": "cliente",
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("register failed with {}", response.status()));
        }
        let body: Value = response.json().await?;
        let token = body["result"]["token"]
            .as_str()
            .ok_or_else(|| anyhow!("register response without token: {body}"))?
            .to_string();
        Ok((token, body["result"]["usuario"].clone()))
    }

    /// Submits a carrier application through the public form and returns the
    /// created profile.
    pub async fn apply_carrier(&self, nombre: &str, email: &str, zona: &str) -> Result<Value> {
        let response = self
            .client
            .post(self.url("/transportistas/registro"))
            .json(&registro_json(nombre, email, zona, "Camión"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("application failed with {}", response.status()));
        }
        let body: Value = response.json().await?;
        Ok(body["result"].clone())
    }

    /// Applies, approves through the admin API and sets a known password.
    /// Returns `(carrier profile id, carrier token)`.
    pub async fn approved_carrier(
        &self,
        nombre: &str,
        email: &str,
        zona: &str,
    ) -> Result<(String, String)> {
        let applied = self.apply_carrier(nombre, email, zona).await?;
        let id = applied["id"]
            .as_str()
            .ok_or_else(|| anyhow!("application without id"))?
            .to_string();

        let admin = self.admin_token().await?;
        let response = self
            .client
            .post(self.url(&format!("/admin/transportistas/{id}/aprobar")))
            .bearer_auth(admin)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("approval failed with {}", response.status()));
        }
        let body: Value = response.json().await?;
        let uid = body["result"]["uid"]
            .as_str()
            .ok_or_else(|| anyhow!("approval without uid: {body}"))?;

        access::set_password(&self.app_state.sqlite_provider.db, uid, TEST_PASSWORD).await?;
        let token = self.login(email, TEST_PASSWORD).await?;
        Ok((id, token))
    }

    pub async fn usuario_by_email(&self, email: &str) -> Result<Usuario> {
        access::find_usuario_by_email(&self.app_state.sqlite_provider.db, email)
            .await?
            .ok_or_else(|| anyhow!("no account for {email}"))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// --- Mock Data Helpers ---

pub fn registro_json(nombre: &str, email: &str, zona: &str, tipo: &str) -> Value {
    json!({
        "nombre": nombre,
        "email": email,
        "telefono": "3333-4444",
        "zona": zona,
        "descripcion": format!("Fletes en {zona}"),
        "vehiculo": {
            "tipo": tipo,
            "marca": "Isuzu",
            "modelo": "NPR",
            "anio": 2018,
            "placa": "HAB1234",
            "capacidadKg": 3500,
            "fotos": ["https://media.example.com/camion.jpg"]
        },
        "documentos": {
            "licencia": "https://media.example.com/licencia.pdf",
            "tarjetaCirculacion": "https://media.example.com/tarjeta.pdf"
        }
    })
}

pub fn solicitud_json(transportista_id: &str) -> Value {
    json!({
        "transportistaId": transportista_id,
        "origen": { "direccion": "Col. Kennedy, Tegucigalpa", "lat": 14.0723, "lng": -87.1921 },
        "destino": { "direccion": "Barrio Guamilito, San Pedro Sula", "lat": 15.5042, "lng": -88.0250 },
        "descripcionCarga": "Mudanza de un apartamento de dos habitaciones con refrigeradora",
        "fechaSolicitada": "2026-11-02"
    })
}

/// Generates a JWT for `sub` signed with the test secret.
pub fn generate_jwt(sub: &str, rol: &str) -> Result<String> {
    generate_jwt_with_expiry(sub, rol, 3600)
}

/// Generates a JWT with a custom lifetime. Negative values produce an
/// already-expired token.
pub fn generate_jwt_with_expiry(sub: &str, rol: &str, expires_in_secs: i64) -> Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    let claims = Claims {
        sub: sub.to_string(),
        rol: rol.to_string(),
        iat: now as usize,
        exp: (now + expires_in_secs) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_ref()),
    )?;
    Ok(token)
}
