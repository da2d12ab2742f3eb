//! Sistema de migrações para banco de dados
//!
//! Este módulo gerencia as migrações do banco de dados SQLite

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{error, info};

/// Lista de migrações SQL a serem aplicadas
const MIGRATIONS: &[&str] = &[
    // 001_initial_schema.sql
    r#"
    -- Contas de usuário (e-mail único sem distinção de maiúsculas)
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        patient_id BLOB,
        failed_attempts INTEGER NOT NULL DEFAULT 0,
        locked_until TIMESTAMP,
        created_at TIMESTAMP NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_roles (
        user_id BLOB NOT NULL,
        role TEXT NOT NULL,
        PRIMARY KEY (user_id, role),
        FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
    );

    -- Pacientes (MRN global e imutável)
    CREATE TABLE IF NOT EXISTS patients (
        id BLOB PRIMARY KEY NOT NULL,
        mrn TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        date_of_birth DATE NOT NULL,
        gender TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL,
        assigned_doctor_id BLOB,
        assigned_doctor_email TEXT,
        contact_phone TEXT,
        contact_email TEXT
    );

    -- Consentimento 1:1 com paciente
    CREATE TABLE IF NOT EXISTS consents (
        id BLOB PRIMARY KEY NOT NULL,
        patient_id BLOB NOT NULL UNIQUE,
        allow_doctors BOOLEAN NOT NULL DEFAULT 0,
        allow_nurses BOOLEAN NOT NULL DEFAULT 0,
        updated_at TIMESTAMP NOT NULL,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE RESTRICT
    );

    -- Registros médicos com campos cifrados (somente inclusão)
    CREATE TABLE IF NOT EXISTS medical_records (
        id BLOB PRIMARY KEY NOT NULL,
        patient_id BLOB NOT NULL,
        diagnosis_enc TEXT NOT NULL,
        prescriptions_enc TEXT NOT NULL,
        clinical_notes_enc TEXT NOT NULL,
        created_by_user_id BLOB NOT NULL,
        created_at TIMESTAMP NOT NULL,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE RESTRICT
    );

    -- Trilha de auditoria (somente inclusão)
    CREATE TABLE IF NOT EXISTS audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        actor_user_id BLOB,
        actor_email TEXT NOT NULL DEFAULT '',
        actor_roles TEXT NOT NULL DEFAULT '[]',
        patient_id BLOB,
        action TEXT NOT NULL CHECK (length(action) > 0),
        resource TEXT NOT NULL,
        timestamp TIMESTAMP NOT NULL,
        ip_address TEXT NOT NULL DEFAULT '',
        user_agent TEXT NOT NULL DEFAULT ''
    );

    -- Códigos de uso único
    CREATE TABLE IF NOT EXISTS otps (
        id BLOB PRIMARY KEY NOT NULL,
        patient_id BLOB NOT NULL,
        code TEXT NOT NULL,
        expires_at TIMESTAMP NOT NULL,
        is_used BOOLEAN NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
    );

    -- Notificações ao paciente
    CREATE TABLE IF NOT EXISTS notifications (
        id BLOB PRIMARY KEY NOT NULL,
        patient_id BLOB NOT NULL,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        type TEXT NOT NULL,
        is_read BOOLEAN NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL,
        related_record_id BLOB,
        triggered_by_user_id BLOB,
        triggered_by_email TEXT,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
    );

    -- Índices para otimização
    CREATE INDEX IF NOT EXISTS idx_users_patient_id ON users (patient_id);
    CREATE INDEX IF NOT EXISTS idx_user_roles_role ON user_roles (role);
    CREATE INDEX IF NOT EXISTS idx_patients_assigned_doctor ON patients (assigned_doctor_id);
    CREATE INDEX IF NOT EXISTS idx_medical_records_patient ON medical_records (patient_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_medical_records_author ON medical_records (created_by_user_id);
    CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs (timestamp);
    CREATE INDEX IF NOT EXISTS idx_audit_logs_patient ON audit_logs (patient_id);
    CREATE INDEX IF NOT EXISTS idx_otps_patient_code ON otps (patient_id, code);
    CREATE INDEX IF NOT EXISTS idx_notifications_patient ON notifications (patient_id, is_read, created_at);
    "#,
    // 002_append_only_guards.sql
    r#"
    -- Imutabilidade garantida na camada de armazenamento, qualquer que seja o caminho de código
    CREATE TRIGGER IF NOT EXISTS medical_records_no_update
    BEFORE UPDATE ON medical_records
    BEGIN
        SELECT RAISE(ABORT, 'append-only: medical_records cannot be updated');
    END;

    CREATE TRIGGER IF NOT EXISTS medical_records_no_delete
    BEFORE DELETE ON medical_records
    BEGIN
        SELECT RAISE(ABORT, 'append-only: medical_records cannot be deleted');
    END;

    CREATE TRIGGER IF NOT EXISTS audit_logs_no_update
    BEFORE UPDATE ON audit_logs
    BEGIN
        SELECT RAISE(ABORT, 'append-only: audit_logs cannot be updated');
    END;

    CREATE TRIGGER IF NOT EXISTS audit_logs_no_delete
    BEFORE DELETE ON audit_logs
    BEGIN
        SELECT RAISE(ABORT, 'append-only: audit_logs cannot be deleted');
    END;

    -- O MRN nunca muda depois de atribuído
    CREATE TRIGGER IF NOT EXISTS patients_mrn_immutable
    BEFORE UPDATE OF mrn ON patients
    WHEN NEW.mrn <> OLD.mrn
    BEGIN
        SELECT RAISE(ABORT, 'append-only: patients.mrn is immutable');
    END;

    -- Pacientes nunca são removidos
    CREATE TRIGGER IF NOT EXISTS patients_no_delete
    BEFORE DELETE ON patients
    BEGIN
        SELECT RAISE(ABORT, 'append-only: patients cannot be deleted');
    END;
    "#,
];

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    // Obter a versão atual do banco de dados
    let mut version: i64 = 0;
    match sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
    {
        Ok(v) => version = v,
        Err(e) => {
            error!("Erro ao obter versão do banco: {}", e);
            // Continuar mesmo assim, pois pode ser a primeira execução
        }
    }

    info!("Versão atual do banco: {}", version);

    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;

        if migration_version <= version {
            info!("Migração {} já aplicada", migration_version);
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        let mut transaction = pool.begin().await.context(format!(
            "Falha ao iniciar transação para migração {}",
            migration_version
        ))?;

        sqlx::query(migration_sql)
            .execute(&mut *transaction)
            .await
            .context(format!("Falha ao executar migração {}", migration_version))?;

        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .context(format!(
                "Falha ao atualizar versão para {}",
                migration_version
            ))?;

        transaction.commit().await.context(format!(
            "Falha ao confirmar transação para migração {}",
            migration_version
        ))?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", MIGRATIONS.len());
    Ok(())
}
