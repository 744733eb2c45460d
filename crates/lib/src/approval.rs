//! # Carrier Approval
//!
//! The two administrator workflows for carrier applications. Approval gives
//! the carrier an account with a temporary password and mails it to them;
//! rejection records the reason.
//!
//! Neither workflow is transactional. Each step is a separate write, and a
//! failure part-way leaves the earlier steps in place, so approving again
//! after a failure is safe until the carrier record is marked approved.

use crate::{
    carriers::{self, EstadoVerificacion},
    constants::{
        DEFAULT_REJECTION_REASON, MSG_APPROVED, MSG_CARRIER_ALREADY_APPROVED,
        MSG_EMAIL_BELONGS_TO_ADMIN, MSG_ID_REQUIRED, MSG_REJECTED, PLATFORM_NAME,
    },
    errors::MarketError,
    providers::{
        db::sqlite::SqliteProvider,
        mail::{Email, Mailer},
    },
};
use chrono::Utc;
use fletia_access::{
    self as access, generate_temporary_password, values, AccessError, NuevoUsuario, PerfilUpdate,
    Rol, Usuario,
};
use serde::Serialize;
use tracing::{error, info, warn};

/// The outcome of a successful approval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aprobacion {
    pub uid: String,
    pub message: String,
    /// Whether the credentials email went out. A failed email does not fail
    /// the approval.
    pub email_sent: bool,
}

fn require_id(transportista_id: &str) -> Result<&str, MarketError> {
    let id = transportista_id.trim();
    if id.is_empty() {
        return Err(MarketError::invalid(MSG_ID_REQUIRED));
    }
    Ok(id)
}

/// Creates the carrier's account, or reuses the one already registered with
/// their email and resets its password.
async fn create_or_reuse_account(
    db: &SqliteProvider,
    carrier: &carriers::Transportista,
    password: &str,
) -> Result<Usuario, MarketError> {
    let nuevo = NuevoUsuario {
        email: carrier.email.clone(),
        password: password.to_string(),
        nombre: carrier.nombre.clone(),
        telefono: carrier.telefono.clone(),
        rol: Rol::Transportista,
    };
    match access::create_usuario(&db.db, nuevo).await {
        Ok(usuario) => Ok(usuario),
        Err(AccessError::EmailAlreadyExists) => {
            let existing = access::find_usuario_by_email(&db.db, &carrier.email)
                .await?
                .ok_or_else(|| {
                    MarketError::DataIntegrity(format!(
                        "account for {} reported as existing but not found",
                        carrier.email
                    ))
                })?;
            if existing.rol == Rol::Administrador {
                warn!(uid = %existing.uid, "Refusing to turn an administrator into a carrier");
                return Err(MarketError::precondition(MSG_EMAIL_BELONGS_TO_ADMIN));
            }
            access::set_password(&db.db, &existing.uid, password).await?;
            info!(uid = %existing.uid, "Reusing existing account for approved carrier");
            Ok(existing)
        }
        Err(e) => Err(e.into()),
    }
}

/// Approves a carrier application.
pub async fn approve_carrier(
    db: &SqliteProvider,
    mailer: &dyn Mailer,
    transportista_id: &str,
) -> Result<Aprobacion, MarketError> {
    let id = require_id(transportista_id)?;
    let carrier = carriers::require(db, id).await?;
    if carrier.estado_verificacion == EstadoVerificacion::Aprobado {
        return Err(MarketError::precondition(MSG_CARRIER_ALREADY_APPROVED));
    }

    let password = generate_temporary_password();
    let usuario = create_or_reuse_account(db, &carrier, &password).await?;
    access::set_rol(&db.db, &usuario.uid, Rol::Transportista).await?;

    let conn = db.connect()?;
    conn.execute(
        "UPDATE transportistas SET verificado = 1, estado_verificacion = 'aprobado',
            usuario_id = ?, fecha_aprobacion = ?, motivo_rechazo = NULL, fecha_rechazo = NULL
         WHERE id = ?",
        vec![
            values::text(usuario.uid.clone()),
            values::timestamp(&Utc::now()),
            values::text(id),
        ],
    )
    .await?;
    access::update_profile(
        &db.db,
        &usuario.uid,
        PerfilUpdate {
            nombre: Some(carrier.nombre.clone()),
            telefono: Some(carrier.telefono.clone()),
            foto_perfil: None,
        },
    )
    .await?;
    access::set_activo(&db.db, &usuario.uid, true).await?;
    info!(id = %id, uid = %usuario.uid, "Carrier approved");

    let email = approval_email(&carrier.nombre, &carrier.email, &password);
    let email_sent = match mailer.send(&email).await {
        Ok(()) => {
            info!(to = %carrier.email, "Sent approval email");
            true
        }
        Err(e) => {
            error!(id = %id, to = %carrier.email, error = %e, "Failed to send approval email");
            false
        }
    };

    Ok(Aprobacion {
        uid: usuario.uid,
        message: MSG_APPROVED.to_string(),
        email_sent,
    })
}

/// Rejects a carrier application. A blank `motivo` counts as none given.
pub async fn reject_carrier(
    db: &SqliteProvider,
    transportista_id: &str,
    motivo: Option<&str>,
) -> Result<String, MarketError> {
    let id = require_id(transportista_id)?;
    carriers::require(db, id).await?;
    let motivo = motivo
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_REJECTION_REASON);

    let conn = db.connect()?;
    conn.execute(
        "UPDATE transportistas SET verificado = 0, estado_verificacion = ?,
            motivo_rechazo = ?, fecha_rechazo = ?
         WHERE id = ?",
        vec![
            values::text(EstadoVerificacion::Rechazado.as_str()),
            values::text(motivo),
            values::timestamp(&Utc::now()),
            values::text(id),
        ],
    )
    .await?;
    info!(id = %id, motivo = %motivo, "Carrier rejected");
    Ok(MSG_REJECTED.to_string())
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The welcome email carrying the carrier's temporary credentials.
pub fn approval_email(nombre: &str, email: &str, password: &str) -> Email {
    let html = format!(
        r#"<div style="font-family: sans-serif; color: #333;">
  <h2>¡Hola, {nombre}!</h2>
  <p>Tu solicitud como transportista ha sido <strong>aprobada</strong> exitosamente.</p>
  <p>Ya puedes iniciar sesión en la aplicación con las siguientes credenciales:</p>
  <ul>
    <li><strong>Usuario:</strong> {email}</li>
    <li><strong>Contraseña temporal:</strong> {password}</li>
  </ul>
  <p>Te recomendamos cambiar tu contraseña al iniciar sesión por primera vez.</p>
  <br>
  <p>Saludos,<br>El equipo de {PLATFORM_NAME}</p>
</div>"#,
        nombre = escape_html(nombre),
        email = escape_html(email),
        password = escape_html(password),
    );
    Email {
        to: email.to_string(),
        subject: "¡Bienvenido a Fletia! Tu cuenta ha sido aprobada".to_string(),
        html,
    }
}
