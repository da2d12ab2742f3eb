//! Common Auth - Biblioteca compartilhada de autenticação
//!
//! Esta biblioteca fornece:
//! - Vocabulário de papéis com comparação sem distinção de maiúsculas
//! - Emissão e validação de tokens de sessão assinados
//! - Geração de códigos de uso único
//! - Hash e verificação de senhas

pub mod error;
pub mod otp;
pub mod password;
pub mod roles;
pub mod token;

pub use error::AuthError;
pub use roles::Role;
pub use token::{IssuedToken, JwtConfig, SessionClaims, TokenService};
