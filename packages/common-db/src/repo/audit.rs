//! Consultas da tabela `audit_logs`
//!
//! A trilha é somente-inclusão: este módulo não oferece alteração nem remoção,
//! e os gatilhos do banco rejeitam qualquer tentativa vinda de outro caminho.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{AuditLogEntry, NewAuditEntry};

const AUDIT_COLUMNS: &str = "id, actor_user_id, actor_email, actor_roles, patient_id, action, \
     resource, timestamp, ip_address, user_agent";

/// Inclui uma entrada com o horário UTC atual e devolve o identificador gerado
pub async fn append(pool: &SqlitePool, entry: &NewAuditEntry) -> DbResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO audit_logs (actor_user_id, actor_email, actor_roles, patient_id, action, \
         resource, timestamp, ip_address, user_agent) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING id",
    )
    .bind(entry.actor_user_id)
    .bind(&entry.actor_email)
    .bind(Json(&entry.actor_roles))
    .bind(entry.patient_id)
    .bind(&entry.action)
    .bind(&entry.resource)
    .bind(Utc::now())
    .bind(&entry.ip_address)
    .bind(&entry.user_agent)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Entradas mais recentes primeiro, opcionalmente filtradas por paciente
pub async fn query(
    pool: &SqlitePool,
    patient_id: Option<Uuid>,
    take: i64,
) -> DbResult<Vec<AuditLogEntry>> {
    let entries = match patient_id {
        Some(patient_id) => {
            let sql = format!(
                "SELECT {} FROM audit_logs WHERE patient_id = ? \
                 ORDER BY timestamp DESC, id DESC LIMIT ?",
                AUDIT_COLUMNS
            );
            sqlx::query_as::<_, AuditLogEntry>(&sql)
                .bind(patient_id)
                .bind(take)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM audit_logs ORDER BY timestamp DESC, id DESC LIMIT ?",
                AUDIT_COLUMNS
            );
            sqlx::query_as::<_, AuditLogEntry>(&sql)
                .bind(take)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(entries)
}

pub async fn count(pool: &SqlitePool) -> DbResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await?;
    Ok(total)
}
