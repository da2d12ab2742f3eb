//! Ciclo de vida das notificações ao paciente
//!
//! Apenas o registro é criado; a entrega fica a cargo de outro leitor.

use common_db::models::{NewNotification, Notification, NotificationType};
use common_db::repo;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::error::{GatewayError, GatewayResult};

pub const DEFAULT_NOTIFICATION_TAKE: i64 = 50;

#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: SqlitePool,
}

impl NotificationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn notify_record_added(
        &self,
        patient_id: Uuid,
        record_id: Uuid,
        author: &ActorContext,
    ) -> GatewayResult<Notification> {
        let author_email = if author.email.is_empty() {
            "desconhecido".to_string()
        } else {
            author.email.clone()
        };
        let new = NewNotification {
            patient_id,
            title: "Novo registro médico adicionado".to_string(),
            message: format!(
                "Dr(a). {} adicionou um novo registro ao seu prontuário.",
                author_email
            ),
            kind: NotificationType::RecordAdded,
            related_record_id: Some(record_id),
            triggered_by_user_id: author.user_id,
            triggered_by_email: Some(author_email),
        };
        Ok(repo::notifications::insert(&self.pool, &new).await?)
    }

    pub async fn notify_consent_changed(
        &self,
        patient_id: Uuid,
        allow_doctors: bool,
        allow_nurses: bool,
        actor: &ActorContext,
    ) -> GatewayResult<Notification> {
        let label = |allowed: bool| if allowed { "Permitido" } else { "Negado" };
        let new = NewNotification {
            patient_id,
            title: "Consentimento atualizado".to_string(),
            message: format!(
                "Suas permissões de acesso foram atualizadas. Médicos: {}, Enfermeiros: {}",
                label(allow_doctors),
                label(allow_nurses)
            ),
            kind: NotificationType::ConsentChanged,
            related_record_id: None,
            triggered_by_user_id: actor.user_id,
            triggered_by_email: Some(actor.email.clone()).filter(|e| !e.is_empty()),
        };
        Ok(repo::notifications::insert(&self.pool, &new).await?)
    }

    pub async fn list_all(&self, patient_id: Uuid, take: i64) -> GatewayResult<Vec<Notification>> {
        Ok(repo::notifications::list_all(&self.pool, patient_id, take).await?)
    }

    pub async fn list_unread(&self, patient_id: Uuid) -> GatewayResult<Vec<Notification>> {
        Ok(repo::notifications::list_unread(&self.pool, patient_id).await?)
    }

    /// Marca como lida; notificações de outro paciente são tratadas como inexistentes
    pub async fn mark_read(&self, notification_id: Uuid, patient_id: Uuid) -> GatewayResult<()> {
        if repo::notifications::mark_read(&self.pool, notification_id, patient_id).await? {
            Ok(())
        } else {
            Err(GatewayError::NotFound(format!("Notificação {}", notification_id)))
        }
    }

    pub async fn mark_all_read(&self, patient_id: Uuid) -> GatewayResult<u64> {
        Ok(repo::notifications::mark_all_read(&self.pool, patient_id).await?)
    }
}
