mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ehr_gateway::http::router;
use ehr_gateway::ServiceSettings;

use common::{Harness, ADMIN_EMAIL, PASSWORD};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, value))
}

async fn login(app: &Router, email: &str, password: &str) -> Result<(StatusCode, Value)> {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn admin_token(app: &Router) -> Result<String> {
    let (status, body) = login(app, ADMIN_EMAIL, PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["access_token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ehr-gateway");
    Ok(())
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Não autenticado");

    let (status, _) = send(&app, Method::GET, "/api/portal/records", Some("nao.e.jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_login_and_me() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);

    let (status, body) = login(&app, ADMIN_EMAIL, "senha-errada").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("access_token").is_none());

    let token = admin_token(&app).await?;
    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ADMIN_EMAIL);
    assert_eq!(me["roles"], json!(["Admin"]));

    let actions = h.audit_actions().await?;
    assert!(actions.iter().any(|a| a == "AUTH_LOGIN_FAIL"));
    assert_eq!(actions.last().map(String::as_str), Some("AUTH_LOGIN"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_login_email_is_audited() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);
    let before = h.audit_count().await?;

    let (status, body) = login(&app, "nao-e-email", "x").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("access_token").is_none());

    assert_eq!(h.audit_count().await?, before + 1);
    let actions = h.audit_actions().await?;
    assert_eq!(actions.last().map(String::as_str), Some("AUTH_LOGIN_FAIL"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_body_is_bad_request() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);
    let token = admin_token(&app).await?;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(&token),
        Some(json!({ "email": "nao-e-email", "password": "x", "role": "Doctor" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(&token),
        Some(json!({ "email": "x@clinica.med.br", "password": "Senha@123", "role": "Zelador" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_role_gate_on_admin_routes() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);
    let token = admin_token(&app).await?;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(&token),
        Some(json!({ "email": "recepcao@clinica.med.br", "password": PASSWORD, "role": "Receptionist" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = login(&app, "recepcao@clinica.med.br", PASSWORD).await?;
    let reception = body["access_token"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(&app, Method::GET, "/api/admin/users", Some(&reception), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Acesso negado");

    let (status, users) = send(&app, Method::GET, "/api/admin/users", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(2));

    let (status, logs) = send(&app, Method::GET, "/api/admin/audit-logs?take=5", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs.as_array().map(Vec::len), Some(5));
    Ok(())
}

#[tokio::test]
async fn test_patient_otp_portal_flow() -> Result<()> {
    let h = Harness::new().await?;
    let app = router(h.state.clone(), 8);
    let admin = admin_token(&app).await?;

    let (status, patient) = send(
        &app,
        Method::POST,
        "/api/patients",
        Some(&admin),
        Some(json!({
            "mrn": "P100",
            "full_name": "Carlos Pereira",
            "date_of_birth": "1978-11-02",
            "gender": "Male"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let patient_id = patient["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(&admin),
        Some(json!({
            "email": "carlos@paciente.com",
            "password": PASSWORD,
            "role": "Patient",
            "patient_id": patient_id
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // paciente desconhecido recebe a mesma resposta, sem código
    let (status, unknown) = send(
        &app,
        Method::POST,
        "/api/auth/request-otp",
        None,
        Some(json!({ "patient_id_or_mrn": "P999" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(unknown.get("otp").is_none());

    let (status, issued) = send(
        &app,
        Method::POST,
        "/api/auth/request-otp",
        None,
        Some(json!({ "patient_id_or_mrn": "P100" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(issued["message"], unknown["message"]);
    let otp = issued["otp"].as_str().unwrap_or_default().to_string();
    assert_eq!(otp.len(), 6);

    let otp_login = json!({ "patient_id_or_mrn": "P100", "otp": otp });
    let (status, session) =
        send(&app, Method::POST, "/api/auth/login-otp", None, Some(otp_login.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    let token = session["access_token"].as_str().unwrap_or_default().to_string();

    // código de uso único
    let (status, _) = send(&app, Method::POST, "/api/auth/login-otp", None, Some(otp_login)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, consent) = send(&app, Method::GET, "/api/consents/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(consent["allow_doctors"], false);
    assert_eq!(consent["allow_nurses"], false);

    let (status, consent) = send(
        &app,
        Method::PUT,
        "/api/consents/me",
        Some(&token),
        Some(json!({ "allow_doctors": true, "allow_nurses": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(consent["allow_doctors"], true);

    let (status, unread) =
        send(&app, Method::GET, "/api/portal/notifications/unread", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread.as_array().map(Vec::len), Some(1));

    let (status, records) = send(&app, Method::GET, "/api/portal/records", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records, json!([]));

    // o portal não dá acesso a rotas administrativas
    let (status, _) = send(&app, Method::GET, "/api/admin/audit-logs", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_otp_hidden_unless_enabled() -> Result<()> {
    let h = Harness::with_settings(ServiceSettings::default()).await?;
    let app = router(h.state.clone(), 8);
    let admin = h.admin().await?;
    h.register_patient(&admin, "P200").await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/request-otp",
        None,
        Some(json!({ "patient_id_or_mrn": "P200" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("otp").is_none());
    assert!(h.audit_actions().await?.iter().any(|a| a == "OTP_ISSUE"));
    Ok(())
}
