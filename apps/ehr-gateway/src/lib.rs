//! Gateway de acesso ao prontuário eletrônico
//!
//! Toda leitura clínica passa por papel, consentimento do paciente e trilha de
//! auditoria somente-inclusão; os campos sensíveis são cifrados em repouso.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod services;
pub mod state;
pub mod telemetry;

/// Informações geradas em tempo de compilação pelo `build.rs`
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use state::{AppState, ServiceSettings};
