//! Consentimento mantido pelo próprio paciente

use common_db::models::Consent;
use common_db::repo;
use tracing::{info, warn};

use crate::context::{ActorContext, RoleGate};
use crate::error::{GatewayError, GatewayResult};
use crate::services::audit::AuditAction;
use crate::state::AppState;

pub async fn get_my_consent(state: &AppState, actor: &ActorContext) -> GatewayResult<Consent> {
    actor.require(RoleGate::PatientOnly)?;
    let patient_id = actor.require_patient_id()?;

    let consent = repo::consents::find_for_patient(&state.pool, patient_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("Consentimento do paciente {}", patient_id)))?;

    state
        .audit
        .append(AuditAction::ConsentRead, "consents/me", actor, Some(patient_id))
        .await?;
    Ok(consent)
}

pub async fn update_my_consent(
    state: &AppState,
    actor: &ActorContext,
    allow_doctors: bool,
    allow_nurses: bool,
) -> GatewayResult<Consent> {
    actor.require(RoleGate::PatientOnly)?;
    let patient_id = actor.require_patient_id()?;

    let consent =
        repo::consents::update_flags(&state.pool, patient_id, allow_doctors, allow_nurses).await?;
    state
        .audit
        .append(AuditAction::ConsentUpdate, "consents/me", actor, Some(patient_id))
        .await?;
    info!(
        "Consentimento do paciente {} atualizado (médicos: {}, enfermeiros: {})",
        patient_id, allow_doctors, allow_nurses
    );

    if let Err(e) = state
        .notifications
        .notify_consent_changed(patient_id, allow_doctors, allow_nurses, actor)
        .await
    {
        warn!("Falha ao notificar alteração de consentimento: {}", e);
    }
    Ok(consent)
}
