use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::context::{ActorContext, RequestMeta};
use crate::error::GatewayResult;
use crate::http::dto::{LoginRequest, OtpLoginRequest, RegisterUserRequest, RequestOtpRequest};
use crate::http::validated;
use crate::services::admin::{self, UserSummary};
use crate::services::auth::{self, AuthResponse, MeResponse, OtpRequestOutcome};
use crate::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
        .route("/request-otp", post(request_otp))
        .route("/login-otp", post(login_otp))
}

async fn login(
    State(state): State<Arc<AppState>>,
    meta: RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<AuthResponse>> {
    let payload = validated(payload)?;
    let response = auth::login(&state, meta, &payload.email, &payload.password).await?;
    Ok(Json(response))
}

async fn register(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Json(payload): Json<RegisterUserRequest>,
) -> GatewayResult<Json<UserSummary>> {
    let payload = validated(payload)?;
    let user = admin::register_user(&state, &actor, payload.into()).await?;
    Ok(Json(user))
}

async fn me(actor: ActorContext) -> GatewayResult<Json<MeResponse>> {
    Ok(Json(auth::me(&actor)?))
}

async fn request_otp(
    State(state): State<Arc<AppState>>,
    meta: RequestMeta,
    Json(payload): Json<RequestOtpRequest>,
) -> GatewayResult<Json<OtpRequestOutcome>> {
    let payload = validated(payload)?;
    let outcome = auth::request_otp(&state, meta, &payload.patient_id_or_mrn).await?;
    Ok(Json(outcome))
}

async fn login_otp(
    State(state): State<Arc<AppState>>,
    meta: RequestMeta,
    Json(payload): Json<OtpLoginRequest>,
) -> GatewayResult<Json<AuthResponse>> {
    let payload = validated(payload)?;
    let response =
        auth::login_with_otp(&state, meta, &payload.patient_id_or_mrn, &payload.otp).await?;
    Ok(Json(response))
}
