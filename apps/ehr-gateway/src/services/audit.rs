//! Trilha de auditoria somente-inclusão
//!
//! A imutabilidade é garantida pelos gatilhos do banco; aqui ficam os códigos
//! estáveis das ações e a montagem da entrada a partir do solicitante.
//! Falha ao gravar é fatal para a operação que a originou.

use common_db::models::{AuditLogEntry, NewAuditEntry};
use common_db::repo;
use sqlx::SqlitePool;
use tracing::{debug, error};
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::GatewayResult;

/// Códigos estáveis das ações auditadas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    AuthLogin,
    AuthLoginFail,
    AuthOtpLogin,
    AuthOtpLoginFail,
    OtpIssue,
    ConsentRead,
    ConsentUpdate,
    RecordAdd,
    RecordRead,
    RecordReadDeny,
    PortalRecordRead,
    PrescriptionDownload,
    RecordsDownloadAll,
    PatientCreate,
    PatientRegister,
    PatientRead,
    PatientList,
    PatientAssignDoctor,
    UserCreate,
    AdminUsersRead,
    AdminUserRoleSet,
    AuditLogRead,
    SystemSeed,
}

impl AuditAction {
    pub fn code(&self) -> &'static str {
        match self {
            AuditAction::AuthLogin => "AUTH_LOGIN",
            AuditAction::AuthLoginFail => "AUTH_LOGIN_FAIL",
            AuditAction::AuthOtpLogin => "AUTH_OTP_LOGIN",
            AuditAction::AuthOtpLoginFail => "AUTH_OTP_LOGIN_FAIL",
            AuditAction::OtpIssue => "OTP_ISSUE",
            AuditAction::ConsentRead => "CONSENT_READ",
            AuditAction::ConsentUpdate => "CONSENT_UPDATE",
            AuditAction::RecordAdd => "RECORD_ADD",
            AuditAction::RecordRead => "RECORD_READ",
            AuditAction::RecordReadDeny => "RECORD_READ_DENY",
            AuditAction::PortalRecordRead => "PORTAL_RECORD_READ",
            AuditAction::PrescriptionDownload => "PRESCRIPTION_DOWNLOAD",
            AuditAction::RecordsDownloadAll => "RECORDS_DOWNLOAD_ALL",
            AuditAction::PatientCreate => "PATIENT_CREATE",
            AuditAction::PatientRegister => "PATIENT_REGISTER",
            AuditAction::PatientRead => "PATIENT_READ",
            AuditAction::PatientList => "PATIENT_LIST",
            AuditAction::PatientAssignDoctor => "PATIENT_ASSIGN_DOCTOR",
            AuditAction::UserCreate => "USER_CREATE",
            AuditAction::AdminUsersRead => "ADMIN_USERS_READ",
            AuditAction::AdminUserRoleSet => "ADMIN_USER_ROLE_SET",
            AuditAction::AuditLogRead => "AUDITLOG_READ",
            AuditAction::SystemSeed => "SYSTEM_SEED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone)]
pub struct AuditLedger {
    pool: SqlitePool,
}

impl AuditLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inclui uma entrada com os dados do solicitante no momento da ação
    pub async fn append(
        &self,
        action: AuditAction,
        resource: &str,
        actor: &ActorContext,
        patient_id: Option<Uuid>,
    ) -> GatewayResult<i64> {
        let entry = NewAuditEntry {
            actor_user_id: actor.user_id,
            actor_email: actor.email.clone(),
            actor_roles: actor.roles.clone(),
            patient_id,
            action: action.code().to_string(),
            resource: resource.to_string(),
            ip_address: actor.meta.ip_address.clone(),
            user_agent: actor.meta.user_agent.clone(),
        };

        match repo::audit::append(&self.pool, &entry).await {
            Ok(id) => {
                debug!("Auditoria {} #{} ({})", action, id, resource);
                Ok(id)
            }
            Err(e) => {
                error!("Falha ao gravar auditoria {}: {}", action, e);
                Err(e.into())
            }
        }
    }

    /// Entradas mais recentes primeiro
    pub async fn query(&self, patient_id: Option<Uuid>, take: i64) -> GatewayResult<Vec<AuditLogEntry>> {
        Ok(repo::audit::query(&self.pool, patient_id, take).await?)
    }

    pub async fn count(&self) -> GatewayResult<i64> {
        Ok(repo::audit::count(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestMeta;
    use crate::error::GatewayError;
    use anyhow::Result;
    use common_db::repo::testing::temp_pool;

    #[tokio::test]
    async fn test_append_captures_actor() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let ledger = AuditLedger::new(pool.clone());
        let actor = ActorContext {
            user_id: Some(Uuid::new_v4()),
            email: "medico@clinica.med.br".to_string(),
            roles: vec!["Doctor".to_string()],
            patient_id: None,
            meta: RequestMeta {
                ip_address: "10.0.0.7".to_string(),
                user_agent: "curl/8.0".to_string(),
            },
        };

        ledger.append(AuditAction::RecordRead, "records/x", &actor, None).await?;

        let entries = ledger.query(None, 10).await?;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.action, "RECORD_READ");
        assert_eq!(entry.actor_user_id, actor.user_id);
        assert_eq!(entry.actor_roles, vec!["Doctor".to_string()]);
        assert_eq!(entry.ip_address, "10.0.0.7");
        assert_eq!(entry.user_agent, "curl/8.0");
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_entries_cannot_be_rewritten() -> Result<()> {
        let (_dir, pool) = temp_pool().await?;
        let ledger = AuditLedger::new(pool.clone());
        let anon = ActorContext::anonymous(RequestMeta::default());
        let id = ledger.append(AuditAction::AuthLoginFail, "auth/login", &anon, None).await?;

        let update = sqlx::query("UPDATE audit_logs SET action = 'X' WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .map_err(common_db::error::DbError::from)
            .map_err(GatewayError::from);
        assert!(matches!(update, Err(GatewayError::ImmutabilityViolation(_))));

        let entries = ledger.query(None, 10).await?;
        assert_eq!(entries[0].action, "AUTH_LOGIN_FAIL");
        assert_eq!(ledger.count().await?, 1);
        Ok(())
    }

    #[test]
    fn test_codes_are_unique_and_non_empty() {
        let all = [
            AuditAction::AuthLogin,
            AuditAction::AuthLoginFail,
            AuditAction::AuthOtpLogin,
            AuditAction::AuthOtpLoginFail,
            AuditAction::OtpIssue,
            AuditAction::ConsentRead,
            AuditAction::ConsentUpdate,
            AuditAction::RecordAdd,
            AuditAction::RecordRead,
            AuditAction::RecordReadDeny,
            AuditAction::PortalRecordRead,
            AuditAction::PrescriptionDownload,
            AuditAction::RecordsDownloadAll,
            AuditAction::PatientCreate,
            AuditAction::PatientRegister,
            AuditAction::PatientRead,
            AuditAction::PatientList,
            AuditAction::PatientAssignDoctor,
            AuditAction::UserCreate,
            AuditAction::AdminUsersRead,
            AuditAction::AdminUserRoleSet,
            AuditAction::AuditLogRead,
            AuditAction::SystemSeed,
        ];
        let codes: std::collections::HashSet<&str> = all.iter().map(|a| a.code()).collect();
        assert_eq!(codes.len(), all.len());
        assert!(codes.iter().all(|c| !c.is_empty()));
    }
}
