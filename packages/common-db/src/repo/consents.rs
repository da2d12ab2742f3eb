//! Consultas da tabela `consents`

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::Consent;

pub async fn find_for_patient(pool: &SqlitePool, patient_id: Uuid) -> DbResult<Option<Consent>> {
    let consent = sqlx::query_as::<_, Consent>(
        "SELECT id, patient_id, allow_doctors, allow_nurses, updated_at \
         FROM consents WHERE patient_id = ?",
    )
    .bind(patient_id)
    .fetch_optional(pool)
    .await?;
    Ok(consent)
}

/// Atualiza as duas permissões e o carimbo de tempo
pub async fn update_flags(
    pool: &SqlitePool,
    patient_id: Uuid,
    allow_doctors: bool,
    allow_nurses: bool,
) -> DbResult<Consent> {
    let consent = sqlx::query_as::<_, Consent>(
        "UPDATE consents SET allow_doctors = ?, allow_nurses = ?, updated_at = ? \
         WHERE patient_id = ? \
         RETURNING id, patient_id, allow_doctors, allow_nurses, updated_at",
    )
    .bind(allow_doctors)
    .bind(allow_nurses)
    .bind(Utc::now())
    .bind(patient_id)
    .fetch_optional(pool)
    .await?;

    consent.ok_or_else(|| DbError::NotFound(format!("Consentimento do paciente {}", patient_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::patients;
    use crate::repo::testing::{sample_patient, temp_pool};
    use anyhow::Result;

    #[tokio::test]
    async fn test_update_flags() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let (patient, initial) =
            patients::insert_with_consent(&pool, &sample_patient("P010"), false, false).await?;

        let updated = update_flags(&pool, patient.id, true, false).await?;
        assert!(updated.allow_doctors);
        assert!(!updated.allow_nurses);
        assert_eq!(updated.id, initial.id);
        assert!(updated.updated_at >= initial.updated_at);

        let stored = find_for_patient(&pool, patient.id).await?.expect("consentimento");
        assert_eq!(stored, updated);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_consent() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let missing = Uuid::new_v4();

        assert!(find_for_patient(&pool, missing).await?.is_none());
        assert!(matches!(
            update_flags(&pool, missing, true, true).await,
            Err(DbError::NotFound(_))
        ));
        Ok(())
    }
}
