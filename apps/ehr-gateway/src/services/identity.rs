//! Repositório de identidades: contas, papéis e verificação de senha
//!
//! A verificação aplica bloqueio após falhas consecutivas e nunca distingue
//! e-mail inexistente de senha errada: sem conta, a senha ainda é conferida
//! contra um hash fixo, com o mesmo custo do Argon2.

use std::sync::Arc;

use chrono::Duration;
use common_auth::password::{hash_password, verify_password};
use common_auth::{AuthError, Role};
use common_db::models::UserAccount;
use common_db::repo;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{GatewayError, GatewayResult};

/// Falhas consecutivas antes do bloqueio
pub const MAX_FAILED_ATTEMPTS: i64 = 5;
pub const LOCKOUT_MINUTES: i64 = 15;

const DUMMY_PASSWORD: &str = "conta-inexistente";

/// Hash e verificação de senhas; operações caras, executadas fora do runtime
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError>;
}

pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password)
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        verify_password(password, stored_hash)
    }
}

#[axum::async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> GatewayResult<Option<UserAccount>>;
    async fn find_by_id(&self, user_id: Uuid) -> GatewayResult<Option<UserAccount>>;
    async fn find_by_patient_id(&self, patient_id: Uuid) -> GatewayResult<Option<UserAccount>>;
    /// Cria a conta já com o papel inicial, na mesma transação
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        patient_id: Option<Uuid>,
        role: Role,
    ) -> GatewayResult<UserAccount>;
    async fn add_role(&self, user_id: Uuid, role: Role) -> GatewayResult<()>;
    async fn remove_roles(&self, user_id: Uuid, roles: &[Role]) -> GatewayResult<()>;
    /// Substitui todos os papéis por um único, atomicamente
    async fn replace_roles(&self, user_id: Uuid, role: Role) -> GatewayResult<()>;
    async fn roles_for_user(&self, user_id: Uuid) -> GatewayResult<Vec<String>>;
    /// Conta autenticada, ou `None` para qualquer falha (inexistente, bloqueada, senha errada)
    async fn check_password(&self, email: &str, password: &str) -> GatewayResult<Option<UserAccount>>;
    async fn list_users(&self) -> GatewayResult<Vec<UserAccount>>;
    async fn users_in_role(&self, role: Role) -> GatewayResult<Vec<UserAccount>>;
}

pub struct SqliteIdentityStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
    dummy_hash: String,
}

impl SqliteIdentityStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> GatewayResult<Self> {
        Self::with_hasher(pool, clock, Arc::new(Argon2Hasher))
    }

    pub fn with_hasher(
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> GatewayResult<Self> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            pool,
            clock,
            hasher,
            dummy_hash,
        })
    }

    async fn hash_blocking(&self, password: String) -> GatewayResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?
            .map_err(GatewayError::from)
    }

    async fn verify_blocking(&self, password: String, stored_hash: String) -> GatewayResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?
            .map_err(GatewayError::from)
    }

    /// Mesmo custo de uma verificação real, resultado descartado
    async fn verify_dummy(&self, password: &str) -> GatewayResult<()> {
        self.verify_blocking(password.to_string(), self.dummy_hash.clone())
            .await?;
        Ok(())
    }
}

#[axum::async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_by_email(&self, email: &str) -> GatewayResult<Option<UserAccount>> {
        Ok(repo::users::find_by_email(&self.pool, email.trim()).await?)
    }

    async fn find_by_id(&self, user_id: Uuid) -> GatewayResult<Option<UserAccount>> {
        Ok(repo::users::find_by_id(&self.pool, user_id).await?)
    }

    async fn find_by_patient_id(&self, patient_id: Uuid) -> GatewayResult<Option<UserAccount>> {
        Ok(repo::users::find_by_patient_id(&self.pool, patient_id).await?)
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        patient_id: Option<Uuid>,
        role: Role,
    ) -> GatewayResult<UserAccount> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(GatewayError::ValidationFailure(
                "E-mail e senha são obrigatórios".to_string(),
            ));
        }

        let hash = self.hash_blocking(password.to_string()).await?;
        match repo::users::insert(&self.pool, email, &hash, patient_id, &[role.as_str()]).await {
            Ok(user) => {
                info!("Usuário criado: {}", user.id);
                Ok(user)
            }
            Err(e) if e.is_unique_violation() => Err(GatewayError::ValidationFailure(
                "E-mail já cadastrado".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_role(&self, user_id: Uuid, role: Role) -> GatewayResult<()> {
        Ok(repo::users::add_role(&self.pool, user_id, role.as_str()).await?)
    }

    async fn remove_roles(&self, user_id: Uuid, roles: &[Role]) -> GatewayResult<()> {
        let names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        Ok(repo::users::remove_roles(&self.pool, user_id, &names).await?)
    }

    async fn replace_roles(&self, user_id: Uuid, role: Role) -> GatewayResult<()> {
        Ok(repo::users::replace_roles(&self.pool, user_id, role.as_str()).await?)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> GatewayResult<Vec<String>> {
        Ok(repo::users::roles_for(&self.pool, user_id).await?)
    }

    async fn check_password(&self, email: &str, password: &str) -> GatewayResult<Option<UserAccount>> {
        let Some(user) = repo::users::find_by_email(&self.pool, email.trim()).await? else {
            self.verify_dummy(password).await?;
            return Ok(None);
        };

        let now = self.clock.now();
        match user.locked_until {
            Some(until) if until > now => {
                warn!("Tentativa de login em conta bloqueada: {}", user.id);
                self.verify_dummy(password).await?;
                return Ok(None);
            }
            // bloqueio vencido: recomeça a contagem
            Some(_) => repo::users::reset_failed_logins(&self.pool, user.id).await?,
            None => {}
        }

        if self
            .verify_blocking(password.to_string(), user.password_hash.clone())
            .await?
        {
            if user.failed_attempts > 0 {
                repo::users::reset_failed_logins(&self.pool, user.id).await?;
            }
            return Ok(Some(user));
        }

        let attempts = repo::users::record_failed_login(
            &self.pool,
            user.id,
            MAX_FAILED_ATTEMPTS,
            now + Duration::minutes(LOCKOUT_MINUTES),
        )
        .await?;
        if attempts >= MAX_FAILED_ATTEMPTS {
            warn!("Conta {} bloqueada após {} falhas", user.id, attempts);
        }
        Ok(None)
    }

    async fn list_users(&self) -> GatewayResult<Vec<UserAccount>> {
        Ok(repo::users::list(&self.pool).await?)
    }

    async fn users_in_role(&self, role: Role) -> GatewayResult<Vec<UserAccount>> {
        Ok(repo::users::list_in_role(&self.pool, role.as_str()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{MockClock, SystemClock};
    use anyhow::Result;
    use chrono::{DateTime, Utc};
    use common_db::repo::testing::temp_pool;

    fn clock_at(at: DateTime<Utc>) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_now().returning(move || at);
        Arc::new(clock)
    }

    #[tokio::test]
    async fn test_create_and_check_password() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let store = SqliteIdentityStore::new(pool, Arc::new(SystemClock))?;

        let user = store
            .create_user("enf@clinica.med.br", "Senha@123", None, Role::Nurse)
            .await?;
        assert_eq!(store.roles_for_user(user.id).await?, vec!["Nurse"]);

        assert!(store.check_password("ENF@clinica.med.br", "Senha@123").await?.is_some());
        assert!(store.check_password("enf@clinica.med.br", "errada").await?.is_none());
        assert!(store.check_password("ninguem@clinica.med.br", "Senha@123").await?.is_none());

        let duplicate = store.create_user("enf@clinica.med.br", "x", None, Role::Doctor).await;
        assert!(matches!(duplicate, Err(GatewayError::ValidationFailure(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_lockout_after_consecutive_failures() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let start = Utc::now();
        let store = SqliteIdentityStore::new(pool.clone(), clock_at(start))?;
        store.create_user("pac@clinica.med.br", "Senha@123", None, Role::Patient).await?;

        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert!(store.check_password("pac@clinica.med.br", "errada").await?.is_none());
        }
        // bloqueada: nem a senha correta é aceita
        assert!(store.check_password("pac@clinica.med.br", "Senha@123").await?.is_none());

        let later = SqliteIdentityStore::new(
            pool.clone(),
            clock_at(start + Duration::minutes(LOCKOUT_MINUTES + 1)),
        )?;
        let user = later.check_password("pac@clinica.med.br", "Senha@123").await?;
        let user = user.expect("bloqueio deveria ter expirado");

        let stored = later.find_by_id(user.id).await?.expect("usuário");
        assert_eq!(stored.failed_attempts, 0);
        assert!(stored.locked_until.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_success_resets_counter() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let store = SqliteIdentityStore::new(pool, Arc::new(SystemClock))?;
        let user = store.create_user("rec@clinica.med.br", "Senha@123", None, Role::Receptionist).await?;

        for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
            store.check_password("rec@clinica.med.br", "errada").await?;
        }
        assert!(store.check_password("rec@clinica.med.br", "Senha@123").await?.is_some());
        let stored = store.find_by_id(user.id).await?.expect("usuário");
        assert_eq!(stored.failed_attempts, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_role_replacement() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let store = SqliteIdentityStore::new(pool, Arc::new(SystemClock))?;
        let user = store.create_user("x@clinica.med.br", "Senha@123", None, Role::Nurse).await?;

        store.add_role(user.id, Role::Receptionist).await?;
        store.remove_roles(user.id, &[Role::Receptionist]).await?;
        assert_eq!(store.roles_for_user(user.id).await?, vec!["Nurse"]);

        store.replace_roles(user.id, Role::Doctor).await?;
        assert_eq!(store.roles_for_user(user.id).await?, vec!["Doctor"]);
        assert_eq!(store.users_in_role(Role::Doctor).await?.len(), 1);
        assert!(store.users_in_role(Role::Nurse).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("$argon2id$fixo".to_string()));
        hasher
            .expect_verify()
            .withf(|password, stored| {
                password.to_string() == "Senha@123" && stored.to_string() == "$argon2id$fixo"
            })
            .times(1)
            .returning(|_, _| Ok(true));
        let store = SqliteIdentityStore::with_hasher(pool, Arc::new(SystemClock), Arc::new(hasher))?;

        // nem um hash que "confere" autentica uma conta inexistente
        let result = store.check_password("ninguem@clinica.med.br", "Senha@123").await?;
        assert!(result.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_locked_account_still_verifies() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let start = Utc::now();
        let store = SqliteIdentityStore::new(pool.clone(), clock_at(start))?;
        let user = store
            .create_user("bloq@clinica.med.br", "Senha@123", None, Role::Nurse)
            .await?;
        repo::users::record_failed_login(&pool, user.id, 1, start + Duration::minutes(5)).await?;

        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash().returning(|_| Ok("$argon2id$fixo".to_string()));
        hasher
            .expect_verify()
            .withf(|_, stored| stored.to_string() == "$argon2id$fixo")
            .times(1)
            .returning(|_, _| Ok(false));
        let locked = SqliteIdentityStore::with_hasher(pool, clock_at(start), Arc::new(hasher))?;

        assert!(locked.check_password("bloq@clinica.med.br", "Senha@123").await?.is_none());
        Ok(())
    }
}
