//! Superfície HTTP do gateway
//!
//! Os handlers apenas extraem, validam e delegam aos casos de uso de
//! `services`, que aplicam papel, consentimento e auditoria.

mod admin;
mod auth;
pub mod dto;
pub mod extract;
mod patients;
mod portal;
mod records;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::built_info;
use crate::error::GatewayResult;
use crate::state::AppState;

pub fn router(state: Arc<AppState>, max_concurrent_requests: usize) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/patients", patients::admin_routes())
        .nest("/receptionist", patients::receptionist_routes())
        .nest("/records", records::routes())
        .nest("/consents", records::consent_routes())
        .nest("/portal", portal::routes())
        .nest("/admin", admin::routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(ConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub rustc: &'static str,
    pub profile: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: built_info::PKG_NAME,
        version: built_info::PKG_VERSION,
        rustc: built_info::RUSTC_VERSION,
        profile: built_info::PROFILE,
    })
}

/// Valida o corpo antes de chegar ao caso de uso
pub(crate) fn validated<T: Validate>(payload: T) -> GatewayResult<T> {
    payload.validate()?;
    Ok(payload)
}
