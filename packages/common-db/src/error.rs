//! Definições de erro para a biblioteca common-db
//!
//! Este módulo define os tipos de erro usados pela biblioteca

use thiserror::Error;

/// Prefixo da mensagem levantada pelos gatilhos de imutabilidade (ver `migrations`)
pub const APPEND_ONLY_MARKER: &str = "append-only";

/// Código estendido do SQLite para `RAISE(ABORT, ...)` dentro de gatilho
const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";

/// Erros específicos para operações de banco de dados
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Erro de conexão com banco de dados: {0}")]
    ConnectionError(String),

    #[error("Erro de consulta: {0}")]
    QueryError(String),

    #[error("Entidade não encontrada: {0}")]
    NotFound(String),

    #[error("Violação de restrição: {0}")]
    ConstraintViolation(String),

    /// Tentativa de alterar ou remover linha de tabela somente-inclusão
    #[error("Registro imutável não pode ser alterado ou removido: {0}")]
    AppendOnlyViolation(String),

    #[error("Erro interno: {0}")]
    InternalError(String),
}

impl DbError {
    /// Indica violação de unicidade (MRN, e-mail, consentimento por paciente)
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation(msg) if msg.contains("UNIQUE"))
    }
}

/// Conversão de erros específicos do SQLx para nossos tipos de erro
impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DbError::NotFound("Registro não encontrado".to_string()),
            sqlx::Error::Database(dbe) => {
                let message = dbe.message().to_string();
                if message.starts_with(APPEND_ONLY_MARKER) {
                    return DbError::AppendOnlyViolation(message);
                }
                if let Some(code) = dbe.code() {
                    if code.as_ref() == SQLITE_CONSTRAINT_TRIGGER {
                        return DbError::AppendOnlyViolation(message);
                    }
                    if code.as_ref() == "23000"
                        || code.as_ref() == "2067"
                        || code.as_ref() == "1555"
                        || code.as_ref() == "787"
                    {
                        return DbError::ConstraintViolation(message);
                    }
                }
                DbError::QueryError(message)
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::QueryError(format!("Coluna não encontrada: {}", col))
            }
            sqlx::Error::TypeNotFound { type_name } => {
                DbError::QueryError(format!("Tipo não encontrado: {}", type_name))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::QueryError(format!("Erro ao decodificar coluna {}: {}", index, source))
            }
            sqlx::Error::Io(io_err) => DbError::ConnectionError(io_err.to_string()),
            sqlx::Error::Configuration(conf_err) => DbError::ConnectionError(conf_err.to_string()),
            sqlx::Error::PoolClosed => {
                DbError::ConnectionError("Pool de conexões fechado".to_string())
            }
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionError("Timeout no pool de conexões".to_string())
            }
            sqlx::Error::WorkerCrashed => {
                DbError::InternalError("Worker do banco de dados falhou".to_string())
            }
            _ => DbError::InternalError(format!("Erro inesperado: {:?}", error)),
        }
    }
}

/// Resultado padrão dos repositórios
pub type DbResult<T> = Result<T, DbError>;
