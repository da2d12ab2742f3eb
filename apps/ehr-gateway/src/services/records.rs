//! Orquestração de acesso aos registros médicos
//!
//! Fluxo de cada requisição: token já validado → papel (por rota) →
//! consentimento (leitura clínica de outro paciente) → operação → auditoria →
//! notificação. Uma negação também é auditada, no lugar da operação.
//! Os campos sensíveis só existem em claro depois da autorização.

use chrono::{DateTime, Utc};
use common_auth::Role;
use common_db::crypto::FieldCipher;
use common_db::models::{AuthoredPatientSummary, MedicalRecord, Patient};
use common_db::repo::{self, records::EncryptedFields};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::{ActorContext, RoleGate};
use crate::error::{GatewayError, GatewayResult};
use crate::services::audit::AuditAction;
use crate::services::export;
use crate::state::AppState;

/// Registro com os campos sensíveis em claro
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub prescriptions: String,
    pub clinical_notes: String,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RecordView {
    fn decrypt(cipher: &FieldCipher, record: &MedicalRecord) -> GatewayResult<Self> {
        Ok(Self {
            id: record.id,
            patient_id: record.patient_id,
            diagnosis: cipher.decrypt(&record.diagnosis_enc)?,
            prescriptions: cipher.decrypt(&record.prescriptions_enc)?,
            clinical_notes: cipher.decrypt(&record.clinical_notes_enc)?,
            created_by_user_id: record.created_by_user_id,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewRecordInput {
    pub diagnosis: String,
    pub prescriptions: String,
    pub clinical_notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordCreated {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fundamento de uma leitura autorizada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBasis {
    Admin,
    OwnRecords,
    Consent,
}

async fn authorize_read(
    state: &AppState,
    actor: &ActorContext,
    patient_id: Uuid,
) -> GatewayResult<Result<AccessBasis, String>> {
    if actor.is_admin() {
        return Ok(Ok(AccessBasis::Admin));
    }
    if actor.has_role(Role::Patient) && actor.patient_id == Some(patient_id) {
        return Ok(Ok(AccessBasis::OwnRecords));
    }
    if actor.require(RoleGate::ClinicalStaff).is_err() {
        return Ok(Err("papel sem acesso clínico".to_string()));
    }
    if state.consent_policy.can_view(&actor.roles, patient_id).await? {
        Ok(Ok(AccessBasis::Consent))
    } else {
        Ok(Err("consentimento não concedido".to_string()))
    }
}

/// Leitura dos registros de um paciente
pub async fn read_patient_records(
    state: &AppState,
    actor: &ActorContext,
    patient_id: Uuid,
) -> GatewayResult<Vec<RecordView>> {
    let user_id = actor.require_user_id()?;
    let resource = format!("records/{}", patient_id);

    let basis = match authorize_read(state, actor, patient_id).await? {
        Ok(basis) => basis,
        Err(reason) => {
            state
                .audit
                .append(AuditAction::RecordReadDeny, &resource, actor, Some(patient_id))
                .await?;
            warn!("Leitura negada: usuário {} paciente {} ({})", user_id, patient_id, reason);
            return Err(GatewayError::AuthorizationDenied(reason));
        }
    };

    let views = load_views(state, patient_id).await?;
    state
        .audit
        .append(AuditAction::RecordRead, &resource, actor, Some(patient_id))
        .await?;
    info!(
        "Leitura permitida: usuário {} paciente {} ({:?}, {} registros)",
        user_id,
        patient_id,
        basis,
        views.len()
    );
    Ok(views)
}

/// Inclusão de registro pelo médico; os três campos são cifrados antes de gravar
pub async fn add_record(
    state: &AppState,
    actor: &ActorContext,
    patient_id: Uuid,
    input: NewRecordInput,
) -> GatewayResult<RecordCreated> {
    actor.require(RoleGate::DoctorOnly)?;
    let author_id = actor.require_user_id()?;

    if !repo::patients::exists(&state.pool, patient_id).await? {
        return Err(GatewayError::NotFound(format!("Paciente {}", patient_id)));
    }

    let fields = EncryptedFields {
        diagnosis_enc: state.cipher.encrypt(&input.diagnosis)?,
        prescriptions_enc: state.cipher.encrypt(&input.prescriptions)?,
        clinical_notes_enc: state.cipher.encrypt(&input.clinical_notes)?,
    };
    let record = repo::records::insert(&state.pool, patient_id, author_id, fields).await?;

    state
        .audit
        .append(
            AuditAction::RecordAdd,
            &format!("records/{}", patient_id),
            actor,
            Some(patient_id),
        )
        .await?;
    info!("Registro {} incluído para paciente {}", record.id, patient_id);

    if let Err(e) = state
        .notifications
        .notify_record_added(patient_id, record.id, actor)
        .await
    {
        warn!("Falha ao notificar novo registro {}: {}", record.id, e);
    }

    Ok(RecordCreated {
        id: record.id,
        patient_id,
        created_at: record.created_at,
    })
}

/// Portal do paciente: seus próprios registros
pub async fn read_own_records(state: &AppState, actor: &ActorContext) -> GatewayResult<Vec<RecordView>> {
    actor.require(RoleGate::PatientOnly)?;
    let patient_id = actor.require_patient_id()?;

    let views = load_views(state, patient_id).await?;
    state
        .audit
        .append(AuditAction::PortalRecordRead, "portal/records", actor, Some(patient_id))
        .await?;
    Ok(views)
}

/// Pacientes para os quais o médico já escreveu registros
pub async fn my_patients(state: &AppState, actor: &ActorContext) -> GatewayResult<Vec<AuthoredPatientSummary>> {
    actor.require(RoleGate::DoctorOnly)?;
    let author_id = actor.require_user_id()?;
    Ok(repo::records::patients_by_author(&state.pool, author_id).await?)
}

/// Receita de um registro do próprio paciente, em HTML
pub async fn export_prescription(
    state: &AppState,
    actor: &ActorContext,
    record_id: Uuid,
) -> GatewayResult<String> {
    actor.require(RoleGate::PatientOnly)?;
    let patient_id = actor.require_patient_id()?;

    let patient = load_patient(state, patient_id).await?;
    let record = repo::records::find_for_patient(&state.pool, record_id, patient_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("Registro {}", record_id)))?;
    let view = RecordView::decrypt(&state.cipher, &record)?;

    let html = export::render_prescription(&patient, &view, state.clock.now());
    state
        .audit
        .append(
            AuditAction::PrescriptionDownload,
            &format!("portal/prescription/{}/download", record_id),
            actor,
            Some(patient_id),
        )
        .await?;
    Ok(html)
}

/// Prontuário completo do próprio paciente, em HTML
pub async fn export_all_records(state: &AppState, actor: &ActorContext) -> GatewayResult<String> {
    actor.require(RoleGate::PatientOnly)?;
    let patient_id = actor.require_patient_id()?;

    let patient = load_patient(state, patient_id).await?;
    let views = load_views(state, patient_id).await?;

    let html = export::render_all_records(&patient, &views, state.clock.now());
    state
        .audit
        .append(
            AuditAction::RecordsDownloadAll,
            "portal/records/download-all",
            actor,
            Some(patient_id),
        )
        .await?;
    Ok(html)
}

async fn load_patient(state: &AppState, patient_id: Uuid) -> GatewayResult<Patient> {
    repo::patients::find_by_id(&state.pool, patient_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("Paciente {}", patient_id)))
}

async fn load_views(state: &AppState, patient_id: Uuid) -> GatewayResult<Vec<RecordView>> {
    let records = repo::records::list_for_patient(&state.pool, patient_id).await?;
    records
        .iter()
        .map(|r| RecordView::decrypt(&state.cipher, r))
        .collect()
}
