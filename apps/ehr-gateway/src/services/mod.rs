//! Componentes de autorização e casos de uso
//!
//! `audit`, `consent_policy`, `otp`, `notifications` e `identity` são os
//! componentes mantidos em `AppState`; os demais módulos expõem os casos de
//! uso como funções que recebem o estado e o solicitante.

pub mod admin;
pub mod audit;
pub mod auth;
pub mod consent_policy;
pub mod consents;
pub mod export;
pub mod identity;
pub mod notifications;
pub mod otp;
pub mod patients;
pub mod records;
pub mod seed;
