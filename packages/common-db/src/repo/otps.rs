//! Consultas da tabela `otps`

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::OneTimeCode;

pub async fn insert(
    pool: &SqlitePool,
    patient_id: Uuid,
    code: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> DbResult<OneTimeCode> {
    let otp = OneTimeCode {
        id: Uuid::new_v4(),
        patient_id,
        code: code.to_string(),
        expires_at,
        is_used: false,
        created_at,
    };

    sqlx::query(
        "INSERT INTO otps (id, patient_id, code, expires_at, is_used, created_at) \
         VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(otp.id)
    .bind(otp.patient_id)
    .bind(&otp.code)
    .bind(otp.expires_at)
    .bind(otp.created_at)
    .execute(pool)
    .await?;

    Ok(otp)
}

/// Consome um código válido de forma atômica.
///
/// A verificação e a marcação acontecem no mesmo `UPDATE`, de modo que duas
/// validações concorrentes do mesmo código não podem ambas ter sucesso.
pub async fn consume(
    pool: &SqlitePool,
    patient_id: Uuid,
    code: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE otps SET is_used = 1 \
         WHERE id = ( \
             SELECT id FROM otps \
             WHERE patient_id = ? AND code = ? AND is_used = 0 AND expires_at > ? \
             ORDER BY expires_at DESC LIMIT 1 \
         ) AND is_used = 0",
    )
    .bind(patient_id)
    .bind(code)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
