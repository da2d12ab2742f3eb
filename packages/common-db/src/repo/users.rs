//! Consultas das tabelas `users` e `user_roles`

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UserAccount;

const USER_COLUMNS: &str =
    "id, email, password_hash, patient_id, failed_attempts, locked_until, created_at";

/// Inclui a conta e seus papéis iniciais na mesma transação
pub async fn insert(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    patient_id: Option<Uuid>,
    roles: &[&str],
) -> DbResult<UserAccount> {
    let user = UserAccount {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        patient_id,
        failed_attempts: 0,
        locked_until: None,
        created_at: Utc::now(),
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, patient_id, failed_attempts, created_at) \
         VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.patient_id)
    .bind(user.created_at)
    .execute(&mut *tx)
    .await?;

    for role in roles {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user.id)
            .bind(*role)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> DbResult<Option<UserAccount>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let user = sqlx::query_as::<_, UserAccount>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> DbResult<Option<UserAccount>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let user = sqlx::query_as::<_, UserAccount>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Primeira conta vinculada ao paciente
pub async fn find_by_patient_id(pool: &SqlitePool, patient_id: Uuid) -> DbResult<Option<UserAccount>> {
    let sql = format!(
        "SELECT {} FROM users WHERE patient_id = ? ORDER BY created_at LIMIT 1",
        USER_COLUMNS
    );
    let user = sqlx::query_as::<_, UserAccount>(&sql)
        .bind(patient_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn list(pool: &SqlitePool) -> DbResult<Vec<UserAccount>> {
    let sql = format!("SELECT {} FROM users ORDER BY email", USER_COLUMNS);
    let users = sqlx::query_as::<_, UserAccount>(&sql).fetch_all(pool).await?;
    Ok(users)
}

pub async fn list_in_role(pool: &SqlitePool, role: &str) -> DbResult<Vec<UserAccount>> {
    let sql = format!(
        "SELECT {} FROM users WHERE id IN (SELECT user_id FROM user_roles WHERE role = ?) \
         ORDER BY email",
        USER_COLUMNS
    );
    let users = sqlx::query_as::<_, UserAccount>(&sql)
        .bind(role)
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn roles_for(pool: &SqlitePool, user_id: Uuid) -> DbResult<Vec<String>> {
    let roles: Vec<String> =
        sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ? ORDER BY role")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(roles)
}

/// Inclui o papel; repetir um papel já atribuído não tem efeito
pub async fn add_role(pool: &SqlitePool, user_id: Uuid, role: &str) -> DbResult<()> {
    sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_roles(pool: &SqlitePool, user_id: Uuid, roles: &[String]) -> DbResult<()> {
    let mut tx = pool.begin().await?;
    for role in roles {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role = ?")
            .bind(user_id)
            .bind(role)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Substitui todos os papéis do usuário por um único papel, atomicamente
pub async fn replace_roles(pool: &SqlitePool, user_id: Uuid, role: &str) -> DbResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?)")
        .bind(user_id)
        .bind(role)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Registra uma falha de senha e, ao atingir o limite, bloqueia até `lock_until`.
/// Devolve o número de falhas consecutivas.
pub async fn record_failed_login(
    pool: &SqlitePool,
    user_id: Uuid,
    max_attempts: i64,
    lock_until: DateTime<Utc>,
) -> DbResult<i64> {
    let attempts: i64 = sqlx::query_scalar(
        "UPDATE users SET failed_attempts = failed_attempts + 1, \
         locked_until = CASE WHEN failed_attempts + 1 >= ? THEN ? ELSE locked_until END \
         WHERE id = ? RETURNING failed_attempts",
    )
    .bind(max_attempts)
    .bind(lock_until)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(attempts)
}

/// Zera o contador de falhas e remove o bloqueio
pub async fn reset_failed_logins(pool: &SqlitePool, user_id: Uuid) -> DbResult<()> {
    sqlx::query("UPDATE users SET failed_attempts = 0, locked_until = NULL WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
