//! # Fletia Access
//!
//! This crate is the central authority for identity, authentication (AuthN)
//! and role (AuthZ) logic of the Fletia marketplace. It owns the `usuarios`
//! table: accounts, password hashes, roles and the active flag.

pub mod password;
pub mod values;

pub use password::{generate_temporary_password, hash_password, verify_password};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::info;
use turso::{Database, Error as TursoError, Row};
use uuid::Uuid;
use values::ValueError;

/// DDL for the `usuarios` table.
pub const CREATE_USUARIOS_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS usuarios (
        uid TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        nombre TEXT NOT NULL,
        telefono TEXT NOT NULL DEFAULT '',
        rol TEXT NOT NULL,
        foto_perfil TEXT NOT NULL DEFAULT '',
        activo INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )";

const USUARIO_COLUMNS: &str = "uid, email, nombre, telefono, rol, foto_perfil, activo, created_at";

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("El correo ya está registrado en otra cuenta.")]
    EmailAlreadyExists,
    #[error("Correo o contraseña incorrectos.")]
    InvalidCredentials,
    #[error("La cuenta está desactivada.")]
    Disabled,
    #[error("Usuario no encontrado: {0}")]
    UserNotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Rol desconocido: {0}")]
    UnknownRol(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Failed to create or find user for email: {0}")]
    UserPersistenceFailed(String),
}

/// The role of an account. Serialized in lowercase Spanish, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Cliente,
    Transportista,
    Administrador,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Cliente => "cliente",
            Rol::Transportista => "transportista",
            Rol::Administrador => "administrador",
        }
    }

    /// The dashboard a signed-in account lands on.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Rol::Cliente => "/cliente/dashboard",
            Rol::Transportista => "/transportista/dashboard",
            Rol::Administrador => "/admin/dashboard",
        }
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rol {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cliente" => Ok(Rol::Cliente),
            "transportista" => Ok(Rol::Transportista),
            "administrador" => Ok(Rol::Administrador),
            other => Err(AccessError::UnknownRol(other.to_string())),
        }
    }
}

/// An account in the `usuarios` table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub uid: String,
    pub email: String,
    pub nombre: String,
    pub telefono: String,
    pub rol: Rol,
    pub foto_perfil: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Usuario {
    type Error = AccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Usuario {
            uid: values::get_text(row, 0)?,
            email: values::get_text(row, 1)?,
            nombre: values::get_text(row, 2)?,
            telefono: values::get_text(row, 3)?,
            rol: values::get_text(row, 4)?.parse()?,
            foto_perfil: values::get_text(row, 5)?,
            activo: values::get_bool(row, 6)?,
            created_at: values::get_datetime(row, 7)?,
        })
    }
}

/// Input for [`create_usuario`].
#[derive(Debug, Clone, Deserialize)]
pub struct NuevoUsuario {
    pub email: String,
    pub password: String,
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
    pub rol: Rol,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfilUpdate {
    pub nombre: Option<String>,
    pub telefono: Option<String>,
    pub foto_perfil: Option<String>,
}

/// Trims and lowercases an email address, rejecting obviously invalid ones.
pub fn normalize_email(email: &str) -> Result<String, AccessError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(AccessError::InvalidArgument(format!(
            "Correo electrónico inválido: '{email}'"
        )));
    }
    Ok(email)
}

/// Creates a new, active account.
///
/// Fails with [`AccessError::EmailAlreadyExists`] when the email is taken.
pub async fn create_usuario(db: &Database, nuevo: NuevoUsuario) -> Result<Usuario, AccessError> {
    let email = normalize_email(&nuevo.email)?;
    let nombre = nuevo.nombre.trim().to_string();
    if nombre.is_empty() {
        return Err(AccessError::InvalidArgument(
            "El nombre es obligatorio.".to_string(),
        ));
    }
    password::validate_password(&nuevo.password)?;

    if find_usuario_by_email(db, &email).await?.is_some() {
        return Err(AccessError::EmailAlreadyExists);
    }

    let uid = Uuid::new_v4().to_string();
    let password_hash = hash_password(&nuevo.password)?;
    let conn = db.connect()?;
    conn.execute(
        "INSERT INTO usuarios (uid, email, password_hash, nombre, telefono, rol, foto_perfil, activo, created_at)
         VALUES (?, ?, ?, ?, ?, ?, '', 1, ?)",
        vec![
            values::text(uid.clone()),
            values::text(email.clone()),
            values::text(password_hash),
            values::text(nombre),
            values::text(nuevo.telefono.trim()),
            values::text(nuevo.rol.as_str()),
            values::timestamp(&Utc::now()),
        ],
    )
    .await?;
    info!(uid = %uid, rol = %nuevo.rol, "Created account");

    get_usuario(db, &uid)
        .await?
        .ok_or(AccessError::UserPersistenceFailed(email))
}

pub async fn get_usuario(db: &Database, uid: &str) -> Result<Option<Usuario>, AccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE uid = ?"),
            vec![values::text(uid)],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Usuario::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Like [`get_usuario`], but a missing account is an error.
pub async fn require_usuario(db: &Database, uid: &str) -> Result<Usuario, AccessError> {
    get_usuario(db, uid)
        .await?
        .ok_or_else(|| AccessError::UserNotFound(uid.to_string()))
}

pub async fn find_usuario_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<Usuario>, AccessError> {
    let email = email.trim().to_lowercase();
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE email = ?"),
            vec![values::text(email)],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Usuario::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Verifies an email/password pair. Disabled accounts are refused even with
/// the right password.
pub async fn authenticate(
    db: &Database,
    email: &str,
    password: &str,
) -> Result<Usuario, AccessError> {
    let email = email.trim().to_lowercase();
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT uid, password_hash FROM usuarios WHERE email = ?",
            vec![values::text(email)],
        )
        .await?;
    let Some(row) = rows.next().await? else {
        return Err(AccessError::InvalidCredentials);
    };
    let uid = values::get_text(&row, 0)?;
    let stored_hash = values::get_text(&row, 1)?;

    if !verify_password(password, &stored_hash) {
        return Err(AccessError::InvalidCredentials);
    }

    let usuario = require_usuario(db, &uid).await?;
    if !usuario.activo {
        return Err(AccessError::Disabled);
    }
    Ok(usuario)
}

pub async fn set_password(db: &Database, uid: &str, password: &str) -> Result<(), AccessError> {
    password::validate_password(password)?;
    require_usuario(db, uid).await?;
    let password_hash = hash_password(password)?;
    let conn = db.connect()?;
    conn.execute(
        "UPDATE usuarios SET password_hash = ? WHERE uid = ?",
        vec![values::text(password_hash), values::text(uid)],
    )
    .await?;
    Ok(())
}

pub async fn set_rol(db: &Database, uid: &str, rol: Rol) -> Result<(), AccessError> {
    require_usuario(db, uid).await?;
    let conn = db.connect()?;
    conn.execute(
        "UPDATE usuarios SET rol = ? WHERE uid = ?",
        vec![values::text(rol.as_str()), values::text(uid)],
    )
    .await?;
    info!(uid = %uid, rol = %rol, "Assigned role");
    Ok(())
}

pub async fn set_activo(db: &Database, uid: &str, activo: bool) -> Result<Usuario, AccessError> {
    require_usuario(db, uid).await?;
    let conn = db.connect()?;
    conn.execute(
        "UPDATE usuarios SET activo = ? WHERE uid = ?",
        vec![values::flag(activo), values::text(uid)],
    )
    .await?;
    info!(uid = %uid, activo, "Changed account status");
    require_usuario(db, uid).await
}

pub async fn update_profile(
    db: &Database,
    uid: &str,
    update: PerfilUpdate,
) -> Result<Usuario, AccessError> {
    let current = require_usuario(db, uid).await?;
    let nombre = match update.nombre {
        Some(nombre) if nombre.trim().is_empty() => {
            return Err(AccessError::InvalidArgument(
                "El nombre es obligatorio.".to_string(),
            ));
        }
        Some(nombre) => nombre.trim().to_string(),
        None => current.nombre,
    };
    let telefono = update
        .telefono
        .map(|t| t.trim().to_string())
        .unwrap_or(current.telefono);
    let foto_perfil = update.foto_perfil.unwrap_or(current.foto_perfil);

    let conn = db.connect()?;
    conn.execute(
        "UPDATE usuarios SET nombre = ?, telefono = ?, foto_perfil = ? WHERE uid = ?",
        vec![
            values::text(nombre),
            values::text(telefono),
            values::text(foto_perfil),
            values::text(uid),
        ],
    )
    .await?;
    require_usuario(db, uid).await
}

/// Lists all accounts, newest first.
pub async fn list_usuarios(db: &Database) -> Result<Vec<Usuario>, AccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {USUARIO_COLUMNS} FROM usuarios ORDER BY created_at DESC"),
            (),
        )
        .await?;
    let mut usuarios = Vec::new();
    while let Some(row) = rows.next().await? {
        usuarios.push(Usuario::try_from(&row)?);
    }
    Ok(usuarios)
}

/// Makes sure an administrator account exists for `email`.
///
/// A new account is created with the given password. An existing account is
/// promoted and re-activated, and keeps its current password.
pub async fn ensure_admin(
    db: &Database,
    email: &str,
    password: &str,
    nombre: &str,
) -> Result<Usuario, AccessError> {
    if let Some(existing) = find_usuario_by_email(db, email).await? {
        if existing.rol != Rol::Administrador {
            set_rol(db, &existing.uid, Rol::Administrador).await?;
        }
        if !existing.activo {
            set_activo(db, &existing.uid, true).await?;
        }
        return require_usuario(db, &existing.uid).await;
    }

    create_usuario(
        db,
        NuevoUsuario {
            email: email.to_string(),
            password: password.to_string(),
            nombre: nombre.to_string(),
            telefono: String::new(),
            rol: Rol::Administrador,
        },
    )
    .await
}
