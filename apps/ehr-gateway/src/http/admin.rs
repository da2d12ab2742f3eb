use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common_db::models::AuditLogEntry;

use crate::context::ActorContext;
use crate::error::GatewayResult;
use crate::http::dto::{AuditLogQuery, SetUserRoleRequest};
use crate::http::validated;
use crate::services::admin::{self, UserSummary};
use crate::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/role", post(set_user_role))
        .route("/audit-logs", get(audit_logs))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
) -> GatewayResult<Json<Vec<UserSummary>>> {
    Ok(Json(admin::list_users(&state, &actor).await?))
}

async fn set_user_role(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Json(payload): Json<SetUserRoleRequest>,
) -> GatewayResult<StatusCode> {
    let payload = validated(payload)?;
    admin::set_user_role(&state, &actor, &payload.email, &payload.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn audit_logs(
    State(state): State<Arc<AppState>>,
    actor: ActorContext,
    Query(query): Query<AuditLogQuery>,
) -> GatewayResult<Json<Vec<AuditLogEntry>>> {
    let entries = admin::audit_logs(&state, &actor, query.patient_id, query.take).await?;
    Ok(Json(entries))
}
