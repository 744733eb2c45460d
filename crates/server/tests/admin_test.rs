//! # Admin Endpoint Tests
//!
//! This file contains integration tests for the admin-only endpoints,
//! verifying role-based access control and the approval queue.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{TestApp, ADMIN_EMAIL};
use fletia::constants::MSG_APPROVED;
use fletia_server::types::ApiResponse;
use serde_json::{json, Value};

#[tokio::test]
async fn test_list_users_as_admin_succeeds() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.register_cliente("uno@example.com", "Uno").await?;
    let token = app.admin_token().await?;

    let response = app
        .client
        .get(app.url("/admin/usuarios"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<Value> = response.json().await?;
    let users = body.result.as_array().expect("an array of accounts");
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u["email"] == ADMIN_EMAIL && u["rol"] == "administrador"));
    // Password hashes never leave the server.
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
    Ok(())
}

#[tokio::test]
async fn test_list_users_as_regular_user_fails() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (token, _) = app.register_cliente("curioso@example.com", "Curioso").await?;

    let response = app
        .client
        .get(app.url("/admin/usuarios"))
        .bearer_auth(token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["status"], "PERMISSION_DENIED");
    Ok(())
}

#[tokio::test]
async fn test_deactivate_and_reactivate_account() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (user_token, usuario) = app.register_cliente("pausa@example.com", "Pausa").await?;
    let uid = usuario["uid"].as_str().unwrap();
    let admin = app.admin_token().await?;

    let response = app
        .client
        .put(app.url(&format!("/admin/usuarios/{uid}/activo")))
        .bearer_auth(&admin)
        .json(&json!({ "activo": false }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["result"]["activo"], false);

    let locked = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&user_token)
        .send()
        .await?;
    assert_eq!(locked.status(), StatusCode::FORBIDDEN);

    app.client
        .put(app.url(&format!("/admin/usuarios/{uid}/activo")))
        .bearer_auth(&admin)
        .json(&json!({ "activo": true }))
        .send()
        .await?;
    let unlocked = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&user_token)
        .send()
        .await?;
    assert_eq!(unlocked.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_deactivate_themselves() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin_token().await?;
    let me = app.usuario_by_email(ADMIN_EMAIL).await?;

    let response = app
        .client
        .put(app.url(&format!("/admin/usuarios/{}/activo", me.uid)))
        .bearer_auth(&admin)
        .json(&json!({ "activo": false }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_approval_queue_filters_by_state() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    let admin = app.admin_token().await?;

    let aprobar = app.apply_carrier("Aprobado", "si@example.com", "Tegucigalpa").await?;
    let rechazar = app.apply_carrier("Rechazado", "no@example.com", "Tegucigalpa").await?;
    app.apply_carrier("Esperando", "espera@example.com", "Tegucigalpa").await?;

    let approved = app
        .client
        .post(app.url(&format!(
            "/admin/transportistas/{}/aprobar",
            aprobar["id"].as_str().unwrap()
        )))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(approved.status(), StatusCode::OK);
    let body: Value = approved.json().await?;
    assert_eq!(body["result"]["message"], MSG_APPROVED);
    assert_eq!(body["result"]["emailSent"], true);

    let rejected = app
        .client
        .post(app.url(&format!(
            "/admin/transportistas/{}/rechazar",
            rechazar["id"].as_str().unwrap()
        )))
        .bearer_auth(&admin)
        .json(&json!({ "motivo": "Placa no coincide" }))
        .send()
        .await?;
    assert_eq!(rejected.status(), StatusCode::OK);

    for (estado, nombre) in [
        ("pendiente", "Esperando"),
        ("aprobado", "Aprobado"),
        ("rechazado", "Rechazado"),
    ] {
        let listed: Value = app
            .client
            .get(app.url(&format!("/admin/transportistas?estado={estado}")))
            .bearer_auth(&admin)
            .send()
            .await?
            .json()
            .await?;
        let items = listed["result"].as_array().unwrap();
        assert_eq!(items.len(), 1, "estado {estado}");
        assert_eq!(items[0]["nombre"], nombre);
    }

    let all: Value = app
        .client
        .get(app.url("/admin/transportistas"))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all["result"].as_array().unwrap().len(), 3);

    let bad_filter = app
        .client
        .get(app.url("/admin/transportistas?estado=perdido"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(bad_filter.status(), StatusCode::BAD_REQUEST);

    // A second approval through the REST surface is a precondition failure.
    let again = app
        .client
        .post(app.url(&format!(
            "/admin/transportistas/{}/aprobar",
            aprobar["id"].as_str().unwrap()
        )))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    let body: Value = again.json().await?;
    assert_eq!(body["error"]["status"], "FAILED_PRECONDITION");
    Ok(())
}
