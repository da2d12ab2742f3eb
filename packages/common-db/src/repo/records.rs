//! Consultas da tabela `medical_records`
//!
//! Apenas inclusão e leitura. Os campos chegam já cifrados.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{AuthoredPatientSummary, MedicalRecord};

const RECORD_COLUMNS: &str = "id, patient_id, diagnosis_enc, prescriptions_enc, \
     clinical_notes_enc, created_by_user_id, created_at";

/// Campos cifrados de um novo registro
#[derive(Debug, Clone)]
pub struct EncryptedFields {
    pub diagnosis_enc: String,
    pub prescriptions_enc: String,
    pub clinical_notes_enc: String,
}

pub async fn insert(
    pool: &SqlitePool,
    patient_id: Uuid,
    author_id: Uuid,
    fields: EncryptedFields,
) -> DbResult<MedicalRecord> {
    let record = MedicalRecord {
        id: Uuid::new_v4(),
        patient_id,
        diagnosis_enc: fields.diagnosis_enc,
        prescriptions_enc: fields.prescriptions_enc,
        clinical_notes_enc: fields.clinical_notes_enc,
        created_by_user_id: author_id,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO medical_records (id, patient_id, diagnosis_enc, prescriptions_enc, \
         clinical_notes_enc, created_by_user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id)
    .bind(record.patient_id)
    .bind(&record.diagnosis_enc)
    .bind(&record.prescriptions_enc)
    .bind(&record.clinical_notes_enc)
    .bind(record.created_by_user_id)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(record)
}

/// Registros do paciente, mais recentes primeiro
pub async fn list_for_patient(pool: &SqlitePool, patient_id: Uuid) -> DbResult<Vec<MedicalRecord>> {
    let sql = format!(
        "SELECT {} FROM medical_records WHERE patient_id = ? ORDER BY created_at DESC, rowid DESC",
        RECORD_COLUMNS
    );
    let records = sqlx::query_as::<_, MedicalRecord>(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await?;
    Ok(records)
}

/// Um registro, somente se pertencer ao paciente informado
pub async fn find_for_patient(
    pool: &SqlitePool,
    record_id: Uuid,
    patient_id: Uuid,
) -> DbResult<Option<MedicalRecord>> {
    let sql = format!(
        "SELECT {} FROM medical_records WHERE id = ? AND patient_id = ?",
        RECORD_COLUMNS
    );
    let record = sqlx::query_as::<_, MedicalRecord>(&sql)
        .bind(record_id)
        .bind(patient_id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

/// Pacientes para os quais o autor já escreveu registros
pub async fn patients_by_author(
    pool: &SqlitePool,
    author_id: Uuid,
) -> DbResult<Vec<AuthoredPatientSummary>> {
    let summaries = sqlx::query_as::<_, AuthoredPatientSummary>(
        "SELECT p.id AS id, p.mrn AS mrn, p.full_name AS full_name, \
                p.date_of_birth AS date_of_birth, p.gender AS gender, \
                MAX(r.created_at) AS last_visit, COUNT(r.id) AS record_count \
         FROM medical_records r \
         JOIN patients p ON p.id = r.patient_id \
         WHERE r.created_by_user_id = ? \
         GROUP BY p.id, p.mrn, p.full_name, p.date_of_birth, p.gender \
         ORDER BY last_visit DESC",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(summaries)
}
