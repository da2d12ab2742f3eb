//! Modelos de dados compartilhados entre aplicações
//!
//! Este módulo define as estruturas de dados principais do prontuário eletrônico

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// Paciente cadastrado
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    /// Identificador interno
    pub id: Uuid,
    /// Número de prontuário (MRN), único e imutável
    pub mrn: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub created_at: DateTime<Utc>,
    /// Médico responsável, quando atribuído
    pub assigned_doctor_id: Option<Uuid>,
    pub assigned_doctor_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

/// Dados para inclusão de um paciente
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub mrn: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub assigned_doctor_id: Option<Uuid>,
    pub assigned_doctor_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

/// Consentimento do paciente para leitura por equipe clínica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Consent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub allow_doctors: bool,
    pub allow_nurses: bool,
    pub updated_at: DateTime<Utc>,
}

/// Registro médico como armazenado (campos sensíveis cifrados)
#[derive(Debug, Clone, FromRow)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis_enc: String,
    pub prescriptions_enc: String,
    pub clinical_notes_enc: String,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Entrada da trilha de auditoria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor_user_id: Option<Uuid>,
    pub actor_email: String,
    /// Papéis do ator no momento da ação
    pub actor_roles: Vec<String>,
    pub patient_id: Option<Uuid>,
    /// Código estável da ação (ex.: `RECORD_READ`)
    pub action: String,
    pub resource: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
}

impl FromRow<'_, SqliteRow> for AuditLogEntry {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let Json(roles): Json<Vec<String>> = row.try_get("actor_roles")?;
        Ok(Self {
            id: row.try_get("id")?,
            actor_user_id: row.try_get("actor_user_id")?,
            actor_email: row.try_get("actor_email")?,
            actor_roles: roles,
            patient_id: row.try_get("patient_id")?,
            action: row.try_get("action")?,
            resource: row.try_get("resource")?,
            timestamp: row.try_get("timestamp")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
        })
    }
}

/// Dados para inclusão na trilha de auditoria
#[derive(Debug, Clone, Default)]
pub struct NewAuditEntry {
    pub actor_user_id: Option<Uuid>,
    pub actor_email: String,
    pub actor_roles: Vec<String>,
    pub patient_id: Option<Uuid>,
    pub action: String,
    pub resource: String,
    pub ip_address: String,
    pub user_agent: String,
}

/// Código de uso único vinculado a um paciente
#[derive(Debug, Clone, FromRow)]
pub struct OneTimeCode {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

/// Classificação das notificações
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    RecordAdded,
    ConsentChanged,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RecordAdded => "RECORD_ADDED",
            NotificationType::ConsentChanged => "CONSENT_CHANGED",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notificação endereçada ao paciente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub title: String,
    pub message: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub related_record_id: Option<Uuid>,
    pub triggered_by_user_id: Option<Uuid>,
    pub triggered_by_email: Option<String>,
}

/// Dados para inclusão de uma notificação
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub patient_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub related_record_id: Option<Uuid>,
    pub triggered_by_user_id: Option<Uuid>,
    pub triggered_by_email: Option<String>,
}

/// Conta de usuário gerenciada pelo repositório de identidades
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub patient_id: Option<Uuid>,
    pub failed_attempts: i64,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Resumo de paciente atendido por um médico
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthoredPatientSummary {
    pub id: Uuid,
    pub mrn: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub last_visit: DateTime<Utc>,
    pub record_count: i64,
}
