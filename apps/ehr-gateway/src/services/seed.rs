//! Conta administrativa inicial

use common_auth::Role;
use tracing::info;

use crate::config::SeedAdmin;
use crate::context::{ActorContext, RequestMeta};
use crate::error::GatewayResult;
use crate::services::audit::AuditAction;
use crate::state::AppState;

pub const SYSTEM_ACTOR_EMAIL: &str = "system";

/// Cria o administrador se ainda não existir. Devolve `true` quando criou.
pub async fn seed_admin(state: &AppState, seed: &SeedAdmin) -> GatewayResult<bool> {
    if state.identity.find_by_email(&seed.email).await?.is_some() {
        return Ok(false);
    }

    let user = state
        .identity
        .create_user(&seed.email, &seed.password, None, Role::Admin)
        .await?;

    let system = ActorContext {
        email: SYSTEM_ACTOR_EMAIL.to_string(),
        ..ActorContext::anonymous(RequestMeta::default())
    };
    state
        .audit
        .append(AuditAction::SystemSeed, "seed/admin", &system, None)
        .await?;
    info!("Administrador inicial criado: {}", user.id);
    Ok(true)
}
