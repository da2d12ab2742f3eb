//! Decisão de acesso da equipe clínica aos registros de um paciente
//!
//! Primeira regra que casar decide:
//! 1. Administrador: permitido, sem consultar o consentimento.
//! 2. Paciente sem consentimento cadastrado: negado.
//! 3. Médico: conforme `allow_doctors`.
//! 4. Enfermeiro: conforme `allow_nurses`.
//! 5. Qualquer outro papel: negado.
//!
//! O consentimento vale por paciente; o autor de um registro não tem acesso
//! implícito a ele.

use common_auth::roles::has_role;
use common_auth::Role;
use common_db::models::Consent;
use common_db::repo;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::GatewayResult;

/// Avalia as regras sobre um consentimento já carregado
pub fn evaluate<S: AsRef<str>>(roles: &[S], consent: Option<&Consent>) -> bool {
    if has_role(roles, Role::Admin) {
        return true;
    }
    let Some(consent) = consent else {
        return false;
    };
    if has_role(roles, Role::Doctor) {
        return consent.allow_doctors;
    }
    if has_role(roles, Role::Nurse) {
        return consent.allow_nurses;
    }
    false
}

#[derive(Debug, Clone)]
pub struct ConsentPolicy {
    pool: SqlitePool,
}

impl ConsentPolicy {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn can_view<S: AsRef<str>>(&self, roles: &[S], patient_id: Uuid) -> GatewayResult<bool> {
        if has_role(roles, Role::Admin) {
            return Ok(true);
        }
        let consent = repo::consents::find_for_patient(&self.pool, patient_id).await?;
        let allowed = evaluate(roles, consent.as_ref());
        debug!(
            "Consentimento para {}: {} (cadastro {})",
            patient_id,
            if allowed { "permitido" } else { "negado" },
            if consent.is_some() { "presente" } else { "ausente" }
        );
        Ok(allowed)
    }
}
