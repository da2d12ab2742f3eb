//! Consultas da tabela `notifications`
//!
//! A única alteração permitida é marcar como lida.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str = "id, patient_id, title, message, type, is_read, created_at, \
     related_record_id, triggered_by_user_id, triggered_by_email";

pub async fn insert(pool: &SqlitePool, new: &NewNotification) -> DbResult<Notification> {
    let notification = Notification {
        id: Uuid::new_v4(),
        patient_id: new.patient_id,
        title: new.title.clone(),
        message: new.message.clone(),
        kind: new.kind.as_str().to_string(),
        is_read: false,
        created_at: Utc::now(),
        related_record_id: new.related_record_id,
        triggered_by_user_id: new.triggered_by_user_id,
        triggered_by_email: new.triggered_by_email.clone(),
    };

    sqlx::query(
        "INSERT INTO notifications (id, patient_id, title, message, type, is_read, created_at, \
         related_record_id, triggered_by_user_id, triggered_by_email) \
         VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?)",
    )
    .bind(notification.id)
    .bind(notification.patient_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.kind)
    .bind(notification.created_at)
    .bind(notification.related_record_id)
    .bind(notification.triggered_by_user_id)
    .bind(&notification.triggered_by_email)
    .execute(pool)
    .await?;

    Ok(notification)
}

/// Últimas `take` notificações do paciente
pub async fn list_all(pool: &SqlitePool, patient_id: Uuid, take: i64) -> DbResult<Vec<Notification>> {
    let sql = format!(
        "SELECT {} FROM notifications WHERE patient_id = ? \
         ORDER BY created_at DESC, rowid DESC LIMIT ?",
        NOTIFICATION_COLUMNS
    );
    let notifications = sqlx::query_as::<_, Notification>(&sql)
        .bind(patient_id)
        .bind(take)
        .fetch_all(pool)
        .await?;
    Ok(notifications)
}

pub async fn list_unread(pool: &SqlitePool, patient_id: Uuid) -> DbResult<Vec<Notification>> {
    let sql = format!(
        "SELECT {} FROM notifications WHERE patient_id = ? AND is_read = 0 \
         ORDER BY created_at DESC, rowid DESC",
        NOTIFICATION_COLUMNS
    );
    let notifications = sqlx::query_as::<_, Notification>(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await?;
    Ok(notifications)
}

/// Marca uma notificação como lida, apenas se pertencer ao paciente.
/// Devolve `false` quando nada foi alterado.
pub async fn mark_read(pool: &SqlitePool, notification_id: Uuid, patient_id: Uuid) -> DbResult<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND patient_id = ?")
        .bind(notification_id)
        .bind(patient_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Marca todas as pendentes como lidas e devolve quantas foram alteradas
pub async fn mark_all_read(pool: &SqlitePool, patient_id: Uuid) -> DbResult<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE patient_id = ? AND is_read = 0")
        .bind(patient_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
