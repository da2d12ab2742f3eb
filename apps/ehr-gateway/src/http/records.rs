use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common_db::models::{AuthoredPatientSummary, Consent};
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::GatewayResult;
use crate::http::dto::{AddRecordRequest, UpdateConsentRequest};
use crate::http::validated;
use crate::services::consents;
use crate::services::records::{self, RecordCreated, RecordView};
use crate::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/my-patients", get(my_patients))
        .route("/:patient_id", get(read_records).post(add_record))
}

pub(super) fn consent_routes() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(get_consent).put(update_consent))
}

async fn read_records(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(patient_id): Path<Uuid>,
) -> GatewayResult<Json<Vec<RecordView>>> {
    Ok(Json(records::read_patient_records(&state, &actor, patient_id).await?))
}

async fn add_record(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<AddRecordRequest>,
) -> GatewayResult<(StatusCode, Json<RecordCreated>)> {
    let payload = validated(payload)?;
    let created = records::add_record(&state, &actor, patient_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn my_patients(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<AuthoredPatientSummary>>> {
    Ok(Json(records::my_patients(&state, &actor).await?))
}

async fn get_consent(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Consent>> {
    Ok(Json(consents::get_my_consent(&state, &actor).await?))
}

async fn update_consent(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Json(payload): Json<UpdateConsentRequest>,
) -> GatewayResult<Json<Consent>> {
    let consent =
        consents::update_my_consent(&state, &actor, payload.allow_doctors, payload.allow_nurses)
            .await?;
    Ok(Json(consent))
}
