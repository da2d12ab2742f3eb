//! Autenticação por código de uso único vinculado ao paciente

use std::sync::Arc;

use chrono::Duration;
use common_auth::otp::{generate_code, OTP_VALIDITY_MINUTES};
use common_db::repo;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::GatewayResult;

#[derive(Clone)]
pub struct OtpAuthenticator {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl OtpAuthenticator {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Emite um novo código. Códigos anteriores ainda não usados continuam válidos.
    pub async fn generate(&self, patient_id: Uuid) -> GatewayResult<String> {
        let code = generate_code();
        let now = self.clock.now();
        let expires_at = now + Duration::minutes(OTP_VALIDITY_MINUTES);
        repo::otps::insert(&self.pool, patient_id, &code, now, expires_at).await?;
        info!("Código OTP emitido para paciente {}", patient_id);
        Ok(code)
    }

    /// Consome o código se ele existir, não tiver sido usado e não estiver expirado.
    /// A comparação é exata: espaços ao redor tornam o código inválido.
    /// Qualquer outro caso devolve `false`, sem distinção.
    pub async fn validate(&self, patient_id: Uuid, code: &str) -> GatewayResult<bool> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Ok(false);
        }
        let consumed = repo::otps::consume(&self.pool, patient_id, code, self.clock.now()).await?;
        Ok(consumed)
    }
}
