use anyhow::Result;
use async_trait::async_trait;
use fletia::access::{self, NuevoUsuario, Rol, Usuario};
use fletia::carriers::{self, Documentos, RegistroTransportista, Transportista, Vehiculo};
use fletia::{Email, MailError, Mailer, SqliteProvider};
use std::fmt::Debug;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

/// Password given to every account created through [`TestSetup`].
pub const TEST_PASSWORD: &str = "secreto123";

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        Ok(Self { provider })
    }

    pub async fn create_user(&self, email: &str, nombre: &str, rol: Rol) -> Result<Usuario> {
        let usuario = access::create_usuario(
            &self.provider.db,
            NuevoUsuario {
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                nombre: nombre.to_string(),
                telefono: "9999-0000".to_string(),
                rol,
            },
        )
        .await?;
        Ok(usuario)
    }

    pub async fn create_cliente(&self, email: &str, nombre: &str) -> Result<Usuario> {
        self.create_user(email, nombre, Rol::Cliente).await
    }

    pub async fn create_admin(&self, email: &str) -> Result<Usuario> {
        self.create_user(email, "Admin", Rol::Administrador).await
    }

    /// Submits a complete carrier application without approving it.
    pub async fn apply_carrier(
        &self,
        nombre: &str,
        email: &str,
        zona: &str,
        tipo: &str,
    ) -> Result<Transportista> {
        let registro = RegistroTransportista {
            nombre: nombre.to_string(),
            email: email.to_string(),
            telefono: "3333-4444".to_string(),
            zona: zona.to_string(),
            descripcion: format!("Fletes en {zona}"),
            vehiculo: Vehiculo {
                tipo: tipo.to_string(),
                marca: "Isuzu".to_string(),
                modelo: "NPR".to_string(),
                anio: Some(2018),
                placa: "HAB1234".to_string(),
                capacidad_kg: Some(3500),
                fotos: vec!["https://media.example.com/camion.jpg".to_string()],
            },
            documentos: Documentos {
                licencia: "https://media.example.com/licencia.pdf".to_string(),
                tarjeta_circulacion: "https://media.example.com/tarjeta.pdf".to_string(),
            },
        };
        Ok(carriers::submit_application(&self.provider, registro).await?)
    }

    /// Applies and approves a carrier, then sets a known password on the new
    /// account. Returns the approved profile and its account.
    pub async fn approved_carrier(
        &self,
        nombre: &str,
        email: &str,
        zona: &str,
        tipo: &str,
    ) -> Result<(Transportista, Usuario)> {
        let applied = self.apply_carrier(nombre, email, zona, tipo).await?;
        let mailer = MockMailer::new();
        let aprobacion = fletia::approve_carrier(&self.provider, &mailer, &applied.id).await?;
        access::set_password(&self.provider.db, &aprobacion.uid, TEST_PASSWORD).await?;
        let carrier = carriers::require(&self.provider, &applied.id).await?;
        let usuario = access::require_usuario(&self.provider.db, &aprobacion.uid).await?;
        Ok((carrier, usuario))
    }
}

// --- Mock Mailer ---

/// Records every email instead of sending it. Can be told to fail.
#[derive(Clone, Debug, Default)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<Email>>>,
    fail: Arc<AtomicBool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with an API error.
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.fail.store(true, Ordering::SeqCst);
        mailer
    }

    /// Retrieves the recorded emails for assertion.
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Api {
                status: 503,
                body: "MockMailer: configured to fail".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
