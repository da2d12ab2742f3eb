//! Portal do paciente: registros, documentos para impressão e notificações

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use common_db::models::Notification;
use serde::Serialize;
use uuid::Uuid;

use crate::context::{ActorContext, RoleGate};
use crate::error::GatewayResult;
use crate::services::notifications::DEFAULT_NOTIFICATION_TAKE;
use crate::services::records::{self, RecordView};
use crate::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/records", get(my_records))
        .route("/records/download-all", get(download_all))
        .route("/prescription/:record_id/download", get(download_prescription))
        .route("/notifications", get(notifications))
        .route("/notifications/unread", get(unread_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/:notification_id/read", post(mark_read))
}

#[derive(Debug, Serialize)]
struct MarkedRead {
    updated: u64,
}

async fn my_records(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<RecordView>>> {
    Ok(Json(records::read_own_records(&state, &actor).await?))
}

async fn download_all(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Html<String>> {
    Ok(Html(records::export_all_records(&state, &actor).await?))
}

async fn download_prescription(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(record_id): Path<Uuid>,
) -> GatewayResult<Html<String>> {
    Ok(Html(records::export_prescription(&state, &actor, record_id).await?))
}

async fn notifications(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<Notification>>> {
    let patient_id = patient_of(&actor)?;
    let items = state
        .notifications
        .list_all(patient_id, DEFAULT_NOTIFICATION_TAKE)
        .await?;
    Ok(Json(items))
}

async fn unread_notifications(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<Notification>>> {
    let patient_id = patient_of(&actor)?;
    Ok(Json(state.notifications.list_unread(patient_id).await?))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(notification_id): Path<Uuid>,
) -> GatewayResult<StatusCode> {
    let patient_id = patient_of(&actor)?;
    state.notifications.mark_read(notification_id, patient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<MarkedRead>> {
    let patient_id = patient_of(&actor)?;
    let updated = state.notifications.mark_all_read(patient_id).await?;
    Ok(Json(MarkedRead { updated }))
}

fn patient_of(actor: &ActorContext) -> GatewayResult<Uuid> {
    actor.require(RoleGate::PatientOnly)?;
    actor.require_patient_id()
}
