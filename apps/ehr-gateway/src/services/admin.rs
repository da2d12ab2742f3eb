//! Administração de contas, papéis e consulta da trilha de auditoria

use common_auth::Role;
use common_db::models::AuditLogEntry;
use common_db::repo;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::context::{ActorContext, RoleGate};
use crate::error::{GatewayError, GatewayResult};
use crate::services::audit::AuditAction;
use crate::state::AppState;

pub const DEFAULT_AUDIT_TAKE: i64 = 100;
pub const MAX_AUDIT_TAKE: i64 = 500;

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub patient_id: Option<Uuid>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewUserInput {
    pub email: String,
    pub password: String,
    pub role: String,
    pub patient_id: Option<Uuid>,
}

pub async fn register_user(
    state: &AppState,
    actor: &ActorContext,
    input: NewUserInput,
) -> GatewayResult<UserSummary> {
    actor.require(RoleGate::AdminOnly)?;
    let role = Role::parse(&input.role)?;

    if let Some(patient_id) = input.patient_id {
        if !repo::patients::exists(&state.pool, patient_id).await? {
            return Err(GatewayError::ValidationFailure(
                "Paciente vinculado não encontrado".to_string(),
            ));
        }
    }

    let user = state
        .identity
        .create_user(&input.email, &input.password, input.patient_id, role)
        .await?;

    state
        .audit
        .append(
            AuditAction::UserCreate,
            &format!("auth/register/{}", role),
            actor,
            input.patient_id,
        )
        .await?;
    info!("Usuário {} criado com papel {}", user.id, role);

    Ok(UserSummary {
        id: user.id,
        email: user.email,
        patient_id: user.patient_id,
        roles: vec![role.as_str().to_string()],
    })
}

pub async fn list_users(state: &AppState, actor: &ActorContext) -> GatewayResult<Vec<UserSummary>> {
    actor.require(RoleGate::AdminOnly)?;

    let users = state.identity.list_users().await?;
    let mut summaries = Vec::with_capacity(users.len());
    for user in users {
        let roles = state.identity.roles_for_user(user.id).await?;
        summaries.push(UserSummary {
            id: user.id,
            email: user.email,
            patient_id: user.patient_id,
            roles,
        });
    }

    state
        .audit
        .append(AuditAction::AdminUsersRead, "admin/users", actor, None)
        .await?;
    Ok(summaries)
}

/// Substitui todos os papéis do usuário pelo papel informado
pub async fn set_user_role(
    state: &AppState,
    actor: &ActorContext,
    email: &str,
    role: &str,
) -> GatewayResult<()> {
    actor.require(RoleGate::AdminOnly)?;

    let user = state
        .identity
        .find_by_email(email)
        .await?
        .ok_or_else(|| GatewayError::NotFound("Usuário".to_string()))?;
    let role = Role::parse(role)?;

    state.identity.replace_roles(user.id, role).await?;
    state
        .audit
        .append(
            AuditAction::AdminUserRoleSet,
            &format!("admin/users/role/{}", role),
            actor,
            user.patient_id,
        )
        .await?;
    info!("Papel do usuário {} definido como {}", user.id, role);
    Ok(())
}

/// Limita a quantidade pedida a `1..=MAX_AUDIT_TAKE`
pub fn clamp_take(take: Option<i64>) -> i64 {
    take.unwrap_or(DEFAULT_AUDIT_TAKE).clamp(1, MAX_AUDIT_TAKE)
}

/// Trilha de auditoria, mais recentes primeiro. A própria consulta é auditada depois.
pub async fn audit_logs(
    state: &AppState,
    actor: &ActorContext,
    patient_id: Option<Uuid>,
    take: Option<i64>,
) -> GatewayResult<Vec<AuditLogEntry>> {
    actor.require(RoleGate::AdminOnly)?;

    let entries = state.audit.query(patient_id, clamp_take(take)).await?;
    state
        .audit
        .append(AuditAction::AuditLogRead, "admin/audit-logs", actor, patient_id)
        .await?;
    Ok(entries)
}
