//! Cadastro e consulta de pacientes
//!
//! Os dois caminhos de inclusão (administração e recepção) criam paciente e
//! consentimento na mesma transação, sempre com acesso negado a médicos e
//! enfermeiros até que o próprio paciente decida o contrário.

use chrono::NaiveDate;
use common_auth::Role;
use common_db::models::{NewPatient, Patient};
use common_db::repo;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::context::{ActorContext, RoleGate};
use crate::error::{GatewayError, GatewayResult};
use crate::services::audit::AuditAction;
use crate::state::AppState;

/// Consentimento inicial de todo paciente: nenhum acesso clínico
pub const DEFAULT_ALLOW_DOCTORS: bool = false;
pub const DEFAULT_ALLOW_NURSES: bool = false;

#[derive(Debug, Clone)]
pub struct PatientRegistration {
    pub mrn: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub assigned_doctor_id: Option<Uuid>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub email: String,
}

/// Inclusão pelo administrador
pub async fn create_patient(
    state: &AppState,
    actor: &ActorContext,
    registration: PatientRegistration,
) -> GatewayResult<Patient> {
    actor.require(RoleGate::AdminOnly)?;
    let patient = insert_patient(state, registration).await?;
    state
        .audit
        .append(
            AuditAction::PatientCreate,
            &format!("patients/{}", patient.id),
            actor,
            Some(patient.id),
        )
        .await?;
    Ok(patient)
}

/// Inclusão pela recepção, com médico responsável e contatos opcionais
pub async fn register_patient(
    state: &AppState,
    actor: &ActorContext,
    registration: PatientRegistration,
) -> GatewayResult<Patient> {
    actor.require(RoleGate::FrontDesk)?;
    let patient = insert_patient(state, registration).await?;
    state
        .audit
        .append(
            AuditAction::PatientRegister,
            &format!("receptionist/register-patient/{}", patient.id),
            actor,
            Some(patient.id),
        )
        .await?;
    Ok(patient)
}

async fn insert_patient(state: &AppState, registration: PatientRegistration) -> GatewayResult<Patient> {
    let mrn = registration.mrn.trim().to_string();
    if mrn.is_empty() {
        return Err(GatewayError::ValidationFailure("MRN é obrigatório".to_string()));
    }
    if repo::patients::mrn_exists(&state.pool, &mrn).await? {
        return Err(duplicate_mrn());
    }

    let assigned_doctor_email = match registration.assigned_doctor_id {
        Some(doctor_id) => Some(find_doctor(state, doctor_id).await?.email),
        None => None,
    };

    let new = NewPatient {
        mrn,
        full_name: registration.full_name.trim().to_string(),
        date_of_birth: registration.date_of_birth,
        gender: registration.gender.trim().to_string(),
        assigned_doctor_id: registration.assigned_doctor_id,
        assigned_doctor_email,
        contact_phone: registration.contact_phone,
        contact_email: registration.contact_email,
    };

    match repo::patients::insert_with_consent(
        &state.pool,
        &new,
        DEFAULT_ALLOW_DOCTORS,
        DEFAULT_ALLOW_NURSES,
    )
    .await
    {
        Ok((patient, _consent)) => {
            info!("Paciente {} cadastrado", patient.id);
            Ok(patient)
        }
        Err(e) if e.is_unique_violation() => Err(duplicate_mrn()),
        Err(e) => Err(e.into()),
    }
}

fn duplicate_mrn() -> GatewayError {
    GatewayError::ValidationFailure("MRN já cadastrado".to_string())
}

/// O usuário precisa existir e ter o papel de médico
async fn find_doctor(state: &AppState, doctor_id: Uuid) -> GatewayResult<DoctorSummary> {
    let doctor = state.identity.find_by_id(doctor_id).await?;
    if let Some(doctor) = doctor {
        let roles = state.identity.roles_for_user(doctor.id).await?;
        if common_auth::roles::has_role(&roles, Role::Doctor) {
            return Ok(DoctorSummary {
                id: doctor.id,
                email: doctor.email,
            });
        }
    }
    Err(GatewayError::ValidationFailure("Médico não encontrado".to_string()))
}

pub async fn get_patient(state: &AppState, actor: &ActorContext, patient_id: Uuid) -> GatewayResult<Patient> {
    actor.require(RoleGate::AdminOnly)?;
    let patient = repo::patients::find_by_id(&state.pool, patient_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("Paciente {}", patient_id)))?;
    state
        .audit
        .append(
            AuditAction::PatientRead,
            &format!("patients/{}", patient_id),
            actor,
            Some(patient_id),
        )
        .await?;
    Ok(patient)
}

pub async fn list_patients(state: &AppState, actor: &ActorContext) -> GatewayResult<Vec<Patient>> {
    actor.require(RoleGate::FrontDesk)?;
    let patients = repo::patients::list(&state.pool).await?;
    state
        .audit
        .append(AuditAction::PatientList, "receptionist/patients", actor, None)
        .await?;
    Ok(patients)
}

pub async fn patients_by_doctor(
    state: &AppState,
    actor: &ActorContext,
    doctor_id: Uuid,
) -> GatewayResult<Vec<Patient>> {
    actor.require(RoleGate::FrontDesk)?;
    Ok(repo::patients::list_by_doctor(&state.pool, doctor_id).await?)
}

pub async fn list_doctors(state: &AppState, actor: &ActorContext) -> GatewayResult<Vec<DoctorSummary>> {
    actor.require(RoleGate::FrontDesk)?;
    let doctors = state.identity.users_in_role(Role::Doctor).await?;
    Ok(doctors
        .into_iter()
        .map(|u| DoctorSummary { id: u.id, email: u.email })
        .collect())
}

pub async fn assign_doctor(
    state: &AppState,
    actor: &ActorContext,
    patient_id: Uuid,
    doctor_id: Uuid,
) -> GatewayResult<()> {
    actor.require(RoleGate::FrontDesk)?;
    if !repo::patients::exists(&state.pool, patient_id).await? {
        return Err(GatewayError::NotFound(format!("Paciente {}", patient_id)));
    }
    let doctor = find_doctor(state, doctor_id).await?;
    repo::patients::assign_doctor(&state.pool, patient_id, doctor.id, &doctor.email).await?;
    state
        .audit
        .append(
            AuditAction::PatientAssignDoctor,
            &format!("receptionist/assign-doctor/{}", patient_id),
            actor,
            Some(patient_id),
        )
        .await?;
    Ok(())
}
