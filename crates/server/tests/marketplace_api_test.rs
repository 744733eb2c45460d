//! # Marketplace API Tests
//!
//! Carrier search, the shipment request lifecycle, chat and dashboards over
//! HTTP.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{solicitud_json, TestApp};
use serde_json::{json, Value};
use std::time::Duration;

async fn post_json(app: &TestApp, path: &str, token: &str, body: Value) -> Result<reqwest::Response> {
    Ok(app
        .client
        .post(app.url(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?)
}

async fn get(app: &TestApp, path: &str, token: &str) -> Result<reqwest::Response> {
    Ok(app.client.get(app.url(path)).bearer_auth(token).send().await?)
}

#[tokio::test]
async fn test_public_search_only_lists_verified_carriers() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    app.approved_carrier("Carlos Ruiz", "carlos@example.com", "Tegucigalpa").await?;
    app.approved_carrier("Beatriz Lara", "beatriz@example.com", "San Pedro Sula").await?;
    app.apply_carrier("Pendiente Díaz", "pendiente@example.com", "Tegucigalpa").await?;

    let all: Value = app
        .client
        .get(app.url("/transportistas"))
        .send()
        .await?
        .json()
        .await?;
    let names: Vec<&str> = all["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["nombre"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&"Pendiente Díaz"));

    let filtered: Value = app
        .client
        .get(app.url("/transportistas?zona=Tegucigalpa&texto=carl"))
        .send()
        .await?
        .json()
        .await?;
    let results = filtered["result"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["nombre"], "Carlos Ruiz");

    let zonas: Value = app
        .client
        .get(app.url("/transportistas/zonas"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(zonas["result"], json!(["San Pedro Sula", "Tegucigalpa"]));
    Ok(())
}

#[tokio::test]
async fn test_unverified_profile_is_hidden_from_others() -> Result<()> {
    let app = TestApp::spawn().await?;
    let applied = app.apply_carrier("Oculto", "oculto@example.com", "Tela").await?;
    let id = applied["id"].as_str().unwrap();
    let (cliente, _) = app.register_cliente("miron@example.com", "Mirón").await?;

    let as_cliente = get(&app, &format!("/transportistas/{id}"), &cliente).await?;
    assert_eq!(as_cliente.status(), StatusCode::NOT_FOUND);

    let admin = app.admin_token().await?;
    let as_admin = get(&app, &format!("/transportistas/{id}"), &admin).await?;
    assert_eq!(as_admin.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_request_lifecycle_with_chat_and_rating() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    let (carrier_id, carrier_token) = app
        .approved_carrier("Julio Reyes", "julio@example.com", "Tegucigalpa")
        .await?;
    let (cliente_token, cliente) = app.register_cliente("sofia@example.com", "Sofía Cano").await?;

    // Create the request.
    let response = post_json(&app, "/solicitudes", &cliente_token, solicitud_json(&carrier_id)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let solicitud = &body["result"];
    let id = solicitud["id"].as_str().unwrap().to_string();
    assert_eq!(solicitud["estado"], "pendiente");
    assert_eq!(solicitud["usuarioId"], cliente["uid"]);
    assert_eq!(solicitud["transportistaRegistroId"], carrier_id.as_str());
    assert_eq!(solicitud["tipoVehiculo"], "Camión");
    assert!(solicitud["distanciaKm"].as_f64().unwrap() > 150.0);

    // The conversation exists for both sides.
    let conv: Value = get(&app, &format!("/conversaciones/solicitud/{id}"), &carrier_token)
        .await?
        .json()
        .await?;
    let conv_id = conv["result"]["id"].as_str().unwrap().to_string();
    assert!(conv["result"]["ultimoMensaje"]
        .as_str()
        .unwrap()
        .starts_with("Nueva solicitud de flete: "));

    // The client cannot accept their own request.
    let denied = post_json(&app, &format!("/solicitudes/{id}/aceptar"), &cliente_token, json!({})).await?;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    for (accion, estado) in [("aceptar", "asignada"), ("iniciar", "en_proceso"), ("finalizar", "finalizado")] {
        let response = post_json(&app, &format!("/solicitudes/{id}/{accion}"), &carrier_token, json!({})).await?;
        assert_eq!(response.status(), StatusCode::OK, "accion {accion}");
        let body: Value = response.json().await?;
        assert_eq!(body["result"]["estado"], estado);
    }

    // Finished requests cannot be cancelled.
    let cancel = post_json(&app, &format!("/solicitudes/{id}/cancelar"), &cliente_token, json!({})).await?;
    assert_eq!(cancel.status(), StatusCode::BAD_REQUEST);
    let body: Value = cancel.json().await?;
    assert_eq!(body["error"]["status"], "FAILED_PRECONDITION");

    // Unknown actions are invalid arguments.
    let unknown = post_json(&app, &format!("/solicitudes/{id}/volar"), &carrier_token, json!({})).await?;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    // Rate once.
    let rated = post_json(&app, &format!("/solicitudes/{id}/calificar"), &cliente_token, json!({ "estrellas": 4 })).await?;
    assert_eq!(rated.status(), StatusCode::OK);
    let again = post_json(&app, &format!("/solicitudes/{id}/calificar"), &cliente_token, json!({ "estrellas": 5 })).await?;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let profile: Value = get(&app, "/transportistas/me", &carrier_token).await?.json().await?;
    assert_eq!(profile["result"]["serviciosCompletados"], 1);
    assert_eq!(profile["result"]["totalCalificaciones"], 1);
    assert_eq!(profile["result"]["calificacionPromedio"], 4.0);

    // Listings per role.
    let mine: Value = get(&app, "/solicitudes?estado=finalizado", &cliente_token).await?.json().await?;
    assert_eq!(mine["result"].as_array().unwrap().len(), 1);
    let activas: Value = get(&app, "/solicitudes?estado=activas", &carrier_token).await?.json().await?;
    assert!(activas["result"].as_array().unwrap().is_empty());

    // Conversation list shows it to both.
    let convs: Value = get(&app, "/conversaciones", &cliente_token).await?.json().await?;
    assert_eq!(convs["result"][0]["id"], conv_id.as_str());
    Ok(())
}

#[tokio::test]
async fn test_only_clients_create_requests_for_verified_carriers() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    let (carrier_id, carrier_token) = app
        .approved_carrier("Ana Flores", "anaf@example.com", "Tegucigalpa")
        .await?;
    let pending = app.apply_carrier("Sin Verificar", "sinv@example.com", "Tegucigalpa").await?;
    let (cliente_token, _) = app.register_cliente("pide@example.com", "Pide").await?;

    let by_carrier = post_json(&app, "/solicitudes", &carrier_token, solicitud_json(&carrier_id)).await?;
    assert_eq!(by_carrier.status(), StatusCode::FORBIDDEN);

    let to_pending = post_json(
        &app,
        "/solicitudes",
        &cliente_token,
        solicitud_json(pending["id"].as_str().unwrap()),
    )
    .await?;
    assert_eq!(to_pending.status(), StatusCode::BAD_REQUEST);

    let mut missing = solicitud_json(&carrier_id);
    missing["descripcionCarga"] = json!("  ");
    let invalid = post_json(&app, "/solicitudes", &cliente_token, missing).await?;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body: Value = invalid.json().await?;
    assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
    Ok(())
}

#[tokio::test]
async fn test_chat_messages_read_state_and_stream() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    let (carrier_id, carrier_token) = app
        .approved_carrier("Hugo Soto", "hugo@example.com", "La Ceiba")
        .await?;
    let (cliente_token, _) = app.register_cliente("elena@example.com", "Elena").await?;
    let (intruso_token, _) = app.register_cliente("intruso@example.com", "Intruso").await?;

    let created: Value = post_json(&app, "/solicitudes", &cliente_token, solicitud_json(&carrier_id))
        .await?
        .json()
        .await?;
    let solicitud_id = created["result"]["id"].as_str().unwrap();
    let conv: Value = get(&app, &format!("/conversaciones/solicitud/{solicitud_id}"), &cliente_token)
        .await?
        .json()
        .await?;
    let conv_id = conv["result"]["id"].as_str().unwrap().to_string();

    // The carrier follows the live stream.
    let mut stream_response =
        get(&app, &format!("/conversaciones/{conv_id}/stream"), &carrier_token).await?;
    assert_eq!(stream_response.status(), StatusCode::OK);

    let sent = post_json(
        &app,
        &format!("/conversaciones/{conv_id}/mensajes"),
        &cliente_token,
        json!({ "contenido": "  ¿Puede llegar a las 8?  " }),
    )
    .await?;
    assert_eq!(sent.status(), StatusCode::OK);
    let sent: Value = sent.json().await?;
    assert_eq!(sent["result"]["contenido"], "¿Puede llegar a las 8?");

    let mut received = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !received.contains("Puede llegar") {
        let chunk = tokio::time::timeout_at(deadline, stream_response.chunk())
            .await??
            .expect("stream ended");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(received.contains("event: mensaje"));

    // Empty messages and outsiders are refused.
    let empty = post_json(&app, &format!("/conversaciones/{conv_id}/mensajes"), &cliente_token, json!({ "contenido": "   " })).await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let outsider = get(&app, &format!("/conversaciones/{conv_id}/mensajes"), &intruso_token).await?;
    assert_eq!(outsider.status(), StatusCode::FORBIDDEN);

    // Unread counts feed the carrier dashboard until the carrier reads them.
    let resumen: Value = get(&app, "/dashboard/resumen", &carrier_token).await?.json().await?;
    assert_eq!(resumen["result"]["rol"], "transportista");
    assert_eq!(resumen["result"]["mensajesSinLeer"], 1);

    let leido: Value = post_json(&app, &format!("/conversaciones/{conv_id}/leido"), &carrier_token, json!({}))
        .await?
        .json()
        .await?;
    assert_eq!(leido["result"]["marcados"], 1);

    let history: Value = get(&app, &format!("/conversaciones/{conv_id}/mensajes"), &carrier_token).await?.json().await?;
    let mensajes = history["result"].as_array().unwrap();
    assert_eq!(mensajes.len(), 1);
    assert_eq!(mensajes[0]["leido"], true);
    Ok(())
}

#[tokio::test]
async fn test_dashboards_by_role() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    let (carrier_id, _) = app
        .approved_carrier("Diana Ortiz", "diana@example.com", "Tegucigalpa")
        .await?;
    app.apply_carrier("En Cola", "cola@example.com", "Tegucigalpa").await?;
    let (cliente_token, _) = app.register_cliente("resumen@example.com", "Resumen").await?;
    post_json(&app, "/solicitudes", &cliente_token, solicitud_json(&carrier_id)).await?;

    let cliente: Value = get(&app, "/dashboard/resumen", &cliente_token).await?.json().await?;
    assert_eq!(cliente["result"]["rol"], "cliente");
    assert_eq!(cliente["result"]["solicitudesActivas"], 1);
    assert_eq!(cliente["result"]["conversaciones"], 1);

    let admin_token = app.admin_token().await?;
    let admin: Value = get(&app, "/dashboard/resumen", &admin_token).await?.json().await?;
    assert_eq!(admin["result"]["rol"], "administrador");
    assert_eq!(admin["result"]["transportistasPendientes"], 1);
    assert_eq!(admin["result"]["transportistasAprobados"], 1);
    assert_eq!(admin["result"]["solicitudesTotal"], 1);
    Ok(())
}

#[tokio::test]
async fn test_carrier_profile_self_service() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_mail_ok();
    let (_, carrier_token) = app
        .approved_carrier("Rafael Ponce", "rafael@example.com", "Juticalpa")
        .await?;

    let updated = app
        .client
        .put(app.url("/transportistas/me"))
        .bearer_auth(&carrier_token)
        .json(&json!({
            "zona": "Catacamas",
            "descripcion": "Fletes en Olancho",
            "disponible": true,
            "vehiculo": {
                "tipo": "Pickup",
                "marca": "Toyota",
                "modelo": "Hilux",
                "anio": 2020,
                "placa": "hcd9876",
                "capacidadKg": 1000
            }
        }))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let body: Value = updated.json().await?;
    assert_eq!(body["result"]["zona"], "Catacamas");
    assert_eq!(body["result"]["vehiculo"]["placa"], "HCD9876");
    // Documents were not sent, so they are kept.
    assert_eq!(
        body["result"]["documentos"]["licencia"],
        "https://media.example.com/licencia.pdf"
    );

    let off = app
        .client
        .put(app.url("/transportistas/me/disponible"))
        .bearer_auth(&carrier_token)
        .json(&json!({ "disponible": false }))
        .send()
        .await?;
    let off: Value = off.json().await?;
    assert_eq!(off["result"]["disponible"], false);

    let available: Value = app
        .client
        .get(app.url("/transportistas?soloDisponibles=true"))
        .send()
        .await?
        .json()
        .await?;
    assert!(available["result"].as_array().unwrap().is_empty());

    let (cliente_token, _) = app.register_cliente("noes@example.com", "No Es").await?;
    let not_carrier = get(&app, "/transportistas/me", &cliente_token).await?;
    assert_eq!(not_carrier.status(), StatusCode::FORBIDDEN);
    Ok(())
}
