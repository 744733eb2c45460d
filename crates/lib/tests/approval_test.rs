//! # Carrier Approval Tests
//!
//! Exercises the approve/reject workflows end to end against an in-memory
//! database, with a recording mailer standing in for the mail API.

mod common;

use crate::common::setup_tracing;
use fletia::{
    access::{self, Rol},
    approve_carrier,
    carriers::{self, EstadoVerificacion},
    constants::{
        DEFAULT_REJECTION_REASON, MSG_APPROVED, MSG_EMAIL_BELONGS_TO_ADMIN, MSG_ID_REQUIRED,
        MSG_REJECTED,
    },
    reject_carrier, ErrorKind,
};
use fletia_test_utils::{MockMailer, TestSetup, TEST_PASSWORD};

/// Pulls the temporary password out of the welcome email.
fn password_from_email(html: &str) -> String {
    let marker = "Contraseña temporal:</strong> ";
    let start = html.find(marker).expect("password marker missing") + marker.len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[tokio::test]
async fn test_approve_creates_account_and_sends_credentials() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let applied = setup
        .apply_carrier("Mario López", "mario@example.com", "Tegucigalpa", "Camión")
        .await
        .unwrap();
    assert!(!applied.verificado);
    assert_eq!(applied.usuario_id, None);

    let mailer = MockMailer::new();
    let aprobacion = approve_carrier(db, &mailer, &applied.id).await.unwrap();
    assert_eq!(aprobacion.message, MSG_APPROVED);
    assert!(aprobacion.email_sent);

    // The carrier record is verified and linked.
    let carrier = carriers::require(db, &applied.id).await.unwrap();
    assert!(carrier.verificado);
    assert_eq!(carrier.estado_verificacion, EstadoVerificacion::Aprobado);
    assert_eq!(carrier.usuario_id.as_deref(), Some(aprobacion.uid.as_str()));
    assert!(carrier.fecha_aprobacion.is_some());

    // The account mirrors the profile and carries the carrier role.
    let usuario = access::require_usuario(&db.db, &aprobacion.uid).await.unwrap();
    assert_eq!(usuario.rol, Rol::Transportista);
    assert_eq!(usuario.nombre, "Mario López");
    assert_eq!(usuario.telefono, "3333-4444");
    assert!(usuario.activo);

    // The emailed password logs in.
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "mario@example.com");
    let password = password_from_email(&sent[0].html);
    assert_eq!(password.len(), 10);
    let logged_in = access::authenticate(&db.db, "mario@example.com", &password)
        .await
        .unwrap();
    assert_eq!(logged_in.uid, aprobacion.uid);
}

#[tokio::test]
async fn test_second_approval_is_refused() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let applied = setup
        .apply_carrier("Ana", "ana@example.com", "San Pedro Sula", "Pickup")
        .await
        .unwrap();
    let mailer = MockMailer::new();
    approve_carrier(db, &mailer, &applied.id).await.unwrap();

    let err = approve_carrier(db, &mailer, &applied.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
    assert_eq!(mailer.sent().len(), 1, "no second credentials email");

    let usuarios = access::list_usuarios(&db.db).await.unwrap();
    assert_eq!(
        usuarios.iter().filter(|u| u.email == "ana@example.com").count(),
        1
    );
}

#[tokio::test]
async fn test_existing_account_is_reused_and_password_reset() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let existing = setup
        .create_cliente("luis@example.com", "Luis")
        .await
        .unwrap();
    let applied = setup
        .apply_carrier("Luis Mejía", "luis@example.com", "La Ceiba", "Camión")
        .await
        .unwrap();

    let mailer = MockMailer::new();
    let aprobacion = approve_carrier(db, &mailer, &applied.id).await.unwrap();
    assert_eq!(aprobacion.uid, existing.uid);

    let usuario = access::require_usuario(&db.db, &existing.uid).await.unwrap();
    assert_eq!(usuario.rol, Rol::Transportista);
    assert_eq!(usuario.nombre, "Luis Mejía");

    let old = access::authenticate(&db.db, "luis@example.com", TEST_PASSWORD).await;
    assert!(old.is_err(), "the old password must no longer work");
    let password = password_from_email(&mailer.sent()[0].html);
    assert!(access::authenticate(&db.db, "luis@example.com", &password)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_application_with_admin_email_cannot_take_over_the_account() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let admin = setup.create_admin("ops@fletia.hn").await.unwrap();
    let applied = setup
        .apply_carrier("Impostor", "ops@fletia.hn", "Tegucigalpa", "Camión")
        .await
        .unwrap();

    let mailer = MockMailer::new();
    let err = approve_carrier(db, &mailer, &applied.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
    assert_eq!(err.to_string(), MSG_EMAIL_BELONGS_TO_ADMIN);
    assert!(mailer.sent().is_empty());

    let usuario = access::require_usuario(&db.db, &admin.uid).await.unwrap();
    assert_eq!(usuario.rol, Rol::Administrador);
    assert_eq!(usuario.nombre, "Admin");
    assert!(access::authenticate(&db.db, "ops@fletia.hn", TEST_PASSWORD)
        .await
        .is_ok());

    let carrier = carriers::require(db, &applied.id).await.unwrap();
    assert!(!carrier.verificado);
    assert_eq!(carrier.estado_verificacion, EstadoVerificacion::Pendiente);
    assert!(carrier.usuario_id.is_none());
}

#[tokio::test]
async fn test_failed_email_does_not_fail_approval() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let applied = setup
        .apply_carrier("Beto", "beto@example.com", "Choluteca", "Camión")
        .await
        .unwrap();

    let aprobacion = approve_carrier(db, &MockMailer::failing(), &applied.id)
        .await
        .unwrap();
    assert!(!aprobacion.email_sent);
    let carrier = carriers::require(db, &applied.id).await.unwrap();
    assert!(carrier.verificado);
}

#[tokio::test]
async fn test_missing_and_unknown_ids() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let mailer = MockMailer::new();

    let err = approve_carrier(db, &mailer, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.to_string(), MSG_ID_REQUIRED);

    let err = approve_carrier(db, &mailer, "no-such-id").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "El transportista no existe en la base de datos."
    );

    let err = reject_carrier(db, "   ", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = reject_carrier(db, "no-such-id", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_reject_records_reason_and_allows_reapplication() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let first = setup
        .apply_carrier("Carla", "carla@example.com", "Tegucigalpa", "Pickup")
        .await
        .unwrap();

    // A second open application for the same email is refused.
    let dup = setup
        .apply_carrier("Carla", "carla@example.com", "Tegucigalpa", "Pickup")
        .await
        .unwrap_err();
    assert!(dup.to_string().contains("Ya existe una solicitud"));

    let message = reject_carrier(db, &first.id, Some("Documentos ilegibles"))
        .await
        .unwrap();
    assert_eq!(message, MSG_REJECTED);
    let rejected = carriers::require(db, &first.id).await.unwrap();
    assert_eq!(rejected.estado_verificacion, EstadoVerificacion::Rechazado);
    assert!(!rejected.verificado);
    assert_eq!(rejected.motivo_rechazo.as_deref(), Some("Documentos ilegibles"));
    assert!(rejected.fecha_rechazo.is_some());

    // Once rejected, the carrier may apply again.
    let second = setup
        .apply_carrier("Carla", "carla@example.com", "Tegucigalpa", "Pickup")
        .await
        .unwrap();
    assert_ne!(second.id, first.id);

    // A blank reason falls back to the default.
    reject_carrier(db, &second.id, Some("  ")).await.unwrap();
    let rejected = carriers::require(db, &second.id).await.unwrap();
    assert_eq!(
        rejected.motivo_rechazo.as_deref(),
        Some(DEFAULT_REJECTION_REASON)
    );
}

#[tokio::test]
async fn test_approval_after_rejection_clears_reason() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let applied = setup
        .apply_carrier("Diego", "diego@example.com", "Comayagua", "Camión")
        .await
        .unwrap();
    reject_carrier(db, &applied.id, None).await.unwrap();

    approve_carrier(db, &MockMailer::new(), &applied.id)
        .await
        .unwrap();
    let carrier = carriers::require(db, &applied.id).await.unwrap();
    assert_eq!(carrier.estado_verificacion, EstadoVerificacion::Aprobado);
    assert_eq!(carrier.motivo_rechazo, None);
    assert_eq!(carrier.fecha_rechazo, None);
}

#[tokio::test]
async fn test_approval_queue_lists_unverified_oldest_first() {
    setup_tracing();
    let setup = TestSetup::new().await.unwrap();
    let db = &setup.provider;
    let a = setup
        .apply_carrier("A", "a@example.com", "Tegucigalpa", "Camión")
        .await
        .unwrap();
    let b = setup
        .apply_carrier("B", "b@example.com", "Tegucigalpa", "Camión")
        .await
        .unwrap();
    approve_carrier(db, &MockMailer::new(), &a.id).await.unwrap();

    let queue = carriers::list_unverified(db).await.unwrap();
    let ids: Vec<_> = queue.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![b.id.as_str()]);

    let aprobados = carriers::list(db, Some(EstadoVerificacion::Aprobado))
        .await
        .unwrap();
    assert_eq!(aprobados.len(), 1);
    assert_eq!(aprobados[0].id, a.id);
}
