//! Definições de erro para a biblioteca common-auth

use thiserror::Error;

/// Erros de autenticação
///
/// `InvalidToken` é propositalmente opaco: assinatura incorreta, expiração,
/// emissor ou audiência errados produzem o mesmo erro.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token inválido")]
    InvalidToken,

    #[error("Falha ao emitir token: {0}")]
    TokenIssue(String),

    #[error("Falha ao processar senha: {0}")]
    PasswordHash(String),

    #[error("Papel inválido: {0}")]
    InvalidRole(String),

    #[error("Configuração inválida: {0}")]
    InvalidConfiguration(String),
}
