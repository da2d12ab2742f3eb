//! Configuração carregada das variáveis de ambiente na inicialização
//!
//! Chaves ausentes ou malformadas são erro fatal de inicialização.

use std::net::SocketAddr;

use anyhow::{anyhow, bail, Context, Result};
use common_auth::JwtConfig;
use common_db::crypto::EncryptionKey;
use common_db::DbConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_JWT_ISSUER: &str = "ehr-gateway";
pub const DEFAULT_JWT_AUDIENCE: &str = "ehr-clients";
pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 60;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 256;

/// Conta administrativa criada na primeira inicialização
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub db: DbConfig,
    pub bind_addr: SocketAddr,
    pub encryption_key: EncryptionKey,
    pub jwt: JwtConfig,
    /// Devolve o código OTP na resposta (somente desenvolvimento)
    pub otp_expose_in_response: bool,
    pub seed_admin: Option<SeedAdmin>,
    pub log_json: bool,
    pub max_concurrent_requests: usize,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Monta a configuração a partir de uma função de consulta de variáveis
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_defaults = DbConfig::default();
        let db = DbConfig {
            db_path: get("EHR_DB_PATH").unwrap_or(db_defaults.db_path),
            max_connections: parse_or(
                "EHR_DB_MAX_CONNECTIONS",
                get("EHR_DB_MAX_CONNECTIONS"),
                db_defaults.max_connections,
            )?,
            busy_timeout: db_defaults.busy_timeout,
        };

        let bind_addr = get("EHR_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("EHR_BIND_ADDR inválido")?;

        let encoded_key = get("EHR_ENCRYPTION_KEY")
            .ok_or_else(|| anyhow!("EHR_ENCRYPTION_KEY não definida"))?;
        let encryption_key = EncryptionKey::from_base64(&encoded_key)
            .context("EHR_ENCRYPTION_KEY deve ser base64 de 32 bytes")?;

        let signing_key = get("EHR_JWT_SIGNING_KEY")
            .ok_or_else(|| anyhow!("EHR_JWT_SIGNING_KEY não definida"))?;
        let access_token_minutes = parse_or(
            "EHR_JWT_ACCESS_TOKEN_MINUTES",
            get("EHR_JWT_ACCESS_TOKEN_MINUTES"),
            DEFAULT_ACCESS_TOKEN_MINUTES,
        )?;
        if access_token_minutes <= 0 {
            bail!("EHR_JWT_ACCESS_TOKEN_MINUTES deve ser positivo");
        }
        let jwt = JwtConfig {
            issuer: get("EHR_JWT_ISSUER").unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
            audience: get("EHR_JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
            signing_key,
            access_token_minutes,
        };

        let seed_admin = match (get("EHR_SEED_ADMIN_EMAIL"), get("EHR_SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            (None, None) => None,
            _ => bail!("EHR_SEED_ADMIN_EMAIL e EHR_SEED_ADMIN_PASSWORD devem ser definidas juntas"),
        };

        Ok(Self {
            db,
            bind_addr,
            encryption_key,
            jwt,
            otp_expose_in_response: parse_flag("EHR_OTP_EXPOSE_IN_RESPONSE", get("EHR_OTP_EXPOSE_IN_RESPONSE"))?,
            seed_admin,
            log_json: parse_flag("EHR_LOG_JSON", get("EHR_LOG_JSON"))?,
            max_concurrent_requests: parse_or(
                "EHR_MAX_CONCURRENT_REQUESTS",
                get("EHR_MAX_CONCURRENT_REQUESTS"),
                DEFAULT_MAX_CONCURRENT_REQUESTS,
            )?,
        })
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| anyhow!("{} inválido: {}", name, e)),
        None => Ok(default),
    }
}

fn parse_flag(name: &str, raw: Option<String>) -> Result<bool> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("{} inválido: {}", name, other),
    }
}
