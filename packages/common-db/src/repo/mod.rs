//! Repositórios de acesso às tabelas do prontuário
//!
//! Cada submódulo concentra as consultas SQL de uma entidade. As tabelas
//! `medical_records` e `audit_logs` só expõem inclusão e leitura; qualquer
//! alteração é rejeitada pelos gatilhos definidos em `migrations`.

pub mod audit;
pub mod consents;
pub mod notifications;
pub mod otps;
pub mod patients;
pub mod records;
pub mod users;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    //! Utilitários de teste compartilhados entre os repositórios

    use anyhow::Result;
    use chrono::NaiveDate;
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    use crate::models::NewPatient;
    use crate::{init_db_pool, DbConfig};

    /// Banco temporário já migrado; o diretório deve viver enquanto o pool for usado
    pub async fn temp_pool() -> Result<(TempDir, SqlitePool)> {
        let dir = tempfile::tempdir()?;
        let config = DbConfig {
            db_path: dir.path().join("test.db").to_string_lossy().into_owned(),
            max_connections: 4,
            ..DbConfig::default()
        };
        let pool = init_db_pool(&config).await?;
        Ok((dir, pool))
    }

    /// Paciente de exemplo com o MRN informado
    pub fn sample_patient(mrn: &str) -> NewPatient {
        NewPatient {
            mrn: mrn.to_string(),
            full_name: "Maria Souza".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 15).expect("data válida"),
            gender: "Female".to_string(),
            assigned_doctor_id: None,
            assigned_doctor_email: None,
            contact_phone: None,
            contact_email: None,
        }
    }
}
