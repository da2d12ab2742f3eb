//! Estado compartilhado entre requisições
//!
//! Tudo aqui é imutável após a construção: chaves, pool e serviços podem ser
//! usados concorrentemente sem travas.

use std::sync::Arc;

use common_auth::{JwtConfig, TokenService};
use common_db::crypto::{EncryptionKey, FieldCipher};
use sqlx::SqlitePool;

use crate::clock::{Clock, SystemClock};
use crate::error::GatewayResult;
use crate::services::audit::AuditLedger;
use crate::services::consent_policy::ConsentPolicy;
use crate::services::identity::{IdentityStore, SqliteIdentityStore};
use crate::services::notifications::NotificationService;
use crate::services::otp::OtpAuthenticator;

#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceSettings {
    /// Devolve o código OTP ao solicitante no lugar da entrega fora de banda
    pub otp_expose_in_response: bool,
}

pub struct AppState {
    pub pool: SqlitePool,
    pub cipher: FieldCipher,
    pub tokens: TokenService,
    pub clock: Arc<dyn Clock>,
    pub identity: Arc<dyn IdentityStore>,
    pub audit: AuditLedger,
    pub consent_policy: ConsentPolicy,
    pub otp: OtpAuthenticator,
    pub notifications: NotificationService,
    pub settings: ServiceSettings,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        key: &EncryptionKey,
        jwt: &JwtConfig,
        settings: ServiceSettings,
    ) -> GatewayResult<Self> {
        Self::with_clock(pool, key, jwt, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        pool: SqlitePool,
        key: &EncryptionKey,
        jwt: &JwtConfig,
        settings: ServiceSettings,
        clock: Arc<dyn Clock>,
    ) -> GatewayResult<Self> {
        let identity: Arc<dyn IdentityStore> =
            Arc::new(SqliteIdentityStore::new(pool.clone(), clock.clone())?);

        Ok(Self {
            cipher: FieldCipher::new(key),
            tokens: TokenService::new(jwt)?,
            identity,
            audit: AuditLedger::new(pool.clone()),
            consent_policy: ConsentPolicy::new(pool.clone()),
            otp: OtpAuthenticator::new(pool.clone(), clock.clone()),
            notifications: NotificationService::new(pool.clone()),
            clock,
            pool,
            settings,
        })
    }
}
