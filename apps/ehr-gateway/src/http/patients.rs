use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use common_db::models::Patient;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::GatewayResult;
use crate::http::dto::{AssignDoctorRequest, CreatePatientRequest, RegisterPatientRequest};
use crate::http::validated;
use crate::services::patients::{self, DoctorSummary};
use crate::state::AppState;

pub(super) fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_patient))
        .route("/:patient_id", get(get_patient))
}

pub(super) fn receptionist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/doctors", get(list_doctors))
        .route("/register-patient", post(register_patient))
        .route("/patients", get(list_patients))
        .route("/patients/by-doctor/:doctor_id", get(patients_by_doctor))
        .route("/patients/:patient_id/assign-doctor", put(assign_doctor))
}

async fn create_patient(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Json(payload): Json<CreatePatientRequest>,
) -> GatewayResult<(StatusCode, Json<Patient>)> {
    let payload = validated(payload)?;
    let patient = patients::create_patient(&state, &actor, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

async fn get_patient(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(patient_id): Path<Uuid>,
) -> GatewayResult<Json<Patient>> {
    Ok(Json(patients::get_patient(&state, &actor, patient_id).await?))
}

async fn list_doctors(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<DoctorSummary>>> {
    Ok(Json(patients::list_doctors(&state, &actor).await?))
}

async fn register_patient(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Json(payload): Json<RegisterPatientRequest>,
) -> GatewayResult<(StatusCode, Json<Patient>)> {
    let payload = validated(payload)?;
    let patient = patients::register_patient(&state, &actor, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

async fn list_patients(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<Patient>>> {
    Ok(Json(patients::list_patients(&state, &actor).await?))
}

async fn patients_by_doctor(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(doctor_id): Path<Uuid>,
) -> GatewayResult<Json<Vec<Patient>>> {
    Ok(Json(patients::patients_by_doctor(&state, &actor, doctor_id).await?))
}

async fn assign_doctor(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<AssignDoctorRequest>,
) -> GatewayResult<StatusCode> {
    patients::assign_doctor(&state, &actor, patient_id, payload.doctor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
