//! Ambiente de teste: banco temporário, estado montado e contas prontas
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use common_auth::{JwtConfig, Role};
use common_db::crypto::EncryptionKey;
use common_db::models::Patient;
use common_db::repo::testing::temp_pool;
use tempfile::TempDir;
use uuid::Uuid;

use ehr_gateway::config::SeedAdmin;
use ehr_gateway::context::{ActorContext, RequestMeta};
use ehr_gateway::error::GatewayResult;
use ehr_gateway::services::patients::PatientRegistration;
use ehr_gateway::services::{auth, patients, seed};
use ehr_gateway::{AppState, ServiceSettings};

pub const PASSWORD: &str = "Senha@123";
pub const ADMIN_EMAIL: &str = "admin@clinica.med.br";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: "ehr-gateway".to_string(),
        audience: "ehr-clients".to_string(),
        signing_key: "chave-de-assinatura-de-teste".to_string(),
        access_token_minutes: 60,
    }
}

pub struct Harness {
    _dir: TempDir,
    pub state: Arc<AppState>,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        Self::with_settings(ServiceSettings {
            otp_expose_in_response: true,
        })
        .await
    }

    pub async fn with_settings(settings: ServiceSettings) -> Result<Self> {
        let (dir, pool) = temp_pool().await?;
        let state = AppState::new(pool, &EncryptionKey::generate(), &jwt_config(), settings)?;
        let state = Arc::new(state);

        seed::seed_admin(
            &state,
            &SeedAdmin {
                email: ADMIN_EMAIL.to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await?;

        Ok(Self { _dir: dir, state })
    }

    /// Login por senha; devolve o token e o solicitante correspondente
    pub async fn login(&self, email: &str) -> Result<(String, ActorContext)> {
        let response = auth::login(&self.state, RequestMeta::default(), email, PASSWORD).await?;
        let claims = self.state.tokens.validate(&response.access_token)?;
        let actor = ActorContext::from_claims(&claims, RequestMeta::default());
        Ok((response.access_token, actor))
    }

    pub async fn admin(&self) -> Result<ActorContext> {
        Ok(self.login(ADMIN_EMAIL).await?.1)
    }

    pub async fn user(&self, email: &str, role: Role, patient_id: Option<Uuid>) -> Result<ActorContext> {
        self.state
            .identity
            .create_user(email, PASSWORD, patient_id, role)
            .await?;
        Ok(self.login(email).await?.1)
    }

    pub async fn register_patient(&self, registrar: &ActorContext, mrn: &str) -> GatewayResult<Patient> {
        let registration = PatientRegistration {
            mrn: mrn.to_string(),
            full_name: "Ana Lima".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 7, 22).expect("data válida"),
            gender: "Female".to_string(),
            assigned_doctor_id: None,
            contact_phone: None,
            contact_email: None,
        };
        patients::register_patient(&self.state, registrar, registration).await
    }

    /// Códigos de ação da trilha, do mais antigo para o mais recente
    pub async fn audit_actions(&self) -> Result<Vec<String>> {
        let mut entries = self.state.audit.query(None, 500).await?;
        entries.reverse();
        Ok(entries.into_iter().map(|e| e.action).collect())
    }

    pub async fn audit_count(&self) -> Result<i64> {
        Ok(self.state.audit.count().await?)
    }
}
