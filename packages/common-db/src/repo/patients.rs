//! Consultas da tabela `patients`

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{Consent, NewPatient, Patient};

const PATIENT_COLUMNS: &str = "id, mrn, full_name, date_of_birth, gender, created_at, \
     assigned_doctor_id, assigned_doctor_email, contact_phone, contact_email";

/// Inclui paciente e seu consentimento na mesma transação.
///
/// O consentimento nasce com as permissões recebidas; um MRN repetido
/// devolve `ConstraintViolation`.
pub async fn insert_with_consent(
    pool: &SqlitePool,
    patient: &NewPatient,
    allow_doctors: bool,
    allow_nurses: bool,
) -> DbResult<(Patient, Consent)> {
    let now = Utc::now();
    let created = Patient {
        id: Uuid::new_v4(),
        mrn: patient.mrn.clone(),
        full_name: patient.full_name.clone(),
        date_of_birth: patient.date_of_birth,
        gender: patient.gender.clone(),
        created_at: now,
        assigned_doctor_id: patient.assigned_doctor_id,
        assigned_doctor_email: patient.assigned_doctor_email.clone(),
        contact_phone: patient.contact_phone.clone(),
        contact_email: patient.contact_email.clone(),
    };
    let consent = Consent {
        id: Uuid::new_v4(),
        patient_id: created.id,
        allow_doctors,
        allow_nurses,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO patients (id, mrn, full_name, date_of_birth, gender, created_at, \
         assigned_doctor_id, assigned_doctor_email, contact_phone, contact_email) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(created.id)
    .bind(&created.mrn)
    .bind(&created.full_name)
    .bind(created.date_of_birth)
    .bind(&created.gender)
    .bind(created.created_at)
    .bind(created.assigned_doctor_id)
    .bind(&created.assigned_doctor_email)
    .bind(&created.contact_phone)
    .bind(&created.contact_email)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO consents (id, patient_id, allow_doctors, allow_nurses, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(consent.id)
    .bind(consent.patient_id)
    .bind(consent.allow_doctors)
    .bind(consent.allow_nurses)
    .bind(consent.updated_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(patient_id = %created.id, "Paciente cadastrado");
    Ok((created, consent))
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> DbResult<Option<Patient>> {
    let sql = format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS);
    let patient = sqlx::query_as::<_, Patient>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(patient)
}

pub async fn find_by_mrn(pool: &SqlitePool, mrn: &str) -> DbResult<Option<Patient>> {
    let sql = format!("SELECT {} FROM patients WHERE mrn = ?", PATIENT_COLUMNS);
    let patient = sqlx::query_as::<_, Patient>(&sql)
        .bind(mrn)
        .fetch_optional(pool)
        .await?;
    Ok(patient)
}

pub async fn mrn_exists(pool: &SqlitePool, mrn: &str) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM patients WHERE mrn = ?)")
        .bind(mrn)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn exists(pool: &SqlitePool, id: Uuid) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Todos os pacientes, mais recentes primeiro
pub async fn list(pool: &SqlitePool) -> DbResult<Vec<Patient>> {
    let sql = format!(
        "SELECT {} FROM patients ORDER BY created_at DESC",
        PATIENT_COLUMNS
    );
    let patients = sqlx::query_as::<_, Patient>(&sql).fetch_all(pool).await?;
    Ok(patients)
}

pub async fn list_by_doctor(pool: &SqlitePool, doctor_id: Uuid) -> DbResult<Vec<Patient>> {
    let sql = format!(
        "SELECT {} FROM patients WHERE assigned_doctor_id = ? ORDER BY created_at DESC",
        PATIENT_COLUMNS
    );
    let patients = sqlx::query_as::<_, Patient>(&sql)
        .bind(doctor_id)
        .fetch_all(pool)
        .await?;
    Ok(patients)
}

/// Atribui o médico responsável; `NotFound` se o paciente não existir
pub async fn assign_doctor(
    pool: &SqlitePool,
    patient_id: Uuid,
    doctor_id: Uuid,
    doctor_email: &str,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE patients SET assigned_doctor_id = ?, assigned_doctor_email = ? WHERE id = ?",
    )
    .bind(doctor_id)
    .bind(doctor_email)
    .bind(patient_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("Paciente {}", patient_id)));
    }
    Ok(())
}
