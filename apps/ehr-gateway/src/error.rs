//! Taxonomia de erros do gateway e sua conversão para respostas HTTP

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_auth::AuthError;
use common_db::crypto::CryptoError;
use common_db::error::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Credenciais, token ou código inválidos; nunca informa qual fator falhou
    #[error("Falha de autenticação")]
    AuthenticationFailure,

    /// Papel ou consentimento insuficiente; o motivo fica apenas no log
    #[error("Acesso negado: {0}")]
    AuthorizationDenied(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Entrada inválida: {0}")]
    ValidationFailure(String),

    /// Tentativa de alterar registro somente-inclusão
    #[error("Violação de imutabilidade: {0}")]
    ImmutabilityViolation(String),

    #[error("Falha criptográfica: {0}")]
    CryptoFailure(String),

    #[error("Erro de armazenamento: {0}")]
    Storage(String),

    #[error("Erro interno: {0}")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            GatewayError::ImmutabilityViolation(_)
            | GatewayError::CryptoFailure(_)
            | GatewayError::Storage(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem exposta ao cliente
    fn public_message(&self) -> String {
        match self {
            GatewayError::AuthenticationFailure => "Não autenticado".to_string(),
            GatewayError::AuthorizationDenied(_) => "Acesso negado".to_string(),
            GatewayError::NotFound(_) => "Recurso não encontrado".to_string(),
            GatewayError::ValidationFailure(msg) => msg.clone(),
            _ => "Erro interno".to_string(),
        }
    }
}

impl From<DbError> for GatewayError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound(msg) => GatewayError::NotFound(msg),
            DbError::AppendOnlyViolation(msg) => GatewayError::ImmutabilityViolation(msg),
            DbError::ConstraintViolation(msg) => GatewayError::ValidationFailure(msg),
            other => GatewayError::Storage(other.to_string()),
        }
    }
}

impl From<CryptoError> for GatewayError {
    fn from(error: CryptoError) -> Self {
        GatewayError::CryptoFailure(error.to_string())
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidToken => GatewayError::AuthenticationFailure,
            AuthError::InvalidRole(role) => {
                GatewayError::ValidationFailure(format!("Papel inválido: {}", role))
            }
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        GatewayError::ValidationFailure(format!("Campos inválidos: {}", fields.join(", ")))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Falha ao processar requisição: {}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: GatewayError = DbError::AppendOnlyViolation("append-only: audit_logs".into()).into();
        assert!(matches!(err, GatewayError::ImmutabilityViolation(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: GatewayError = DbError::ConstraintViolation("UNIQUE constraint failed".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: GatewayError = DbError::NotFound("Paciente".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_public_messages_are_generic() {
        let denied = GatewayError::AuthorizationDenied("consentimento negado para médicos".into());
        assert_eq!(denied.public_message(), "Acesso negado");

        let crypto: GatewayError = CryptoError::DecryptionFailed.into();
        assert_eq!(crypto.public_message(), "Erro interno");

        let auth: GatewayError = AuthError::InvalidToken.into();
        assert_eq!(auth.status(), StatusCode::UNAUTHORIZED);
    }
}
