//! Emissão e validação de credenciais de sessão (JWT HS256)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::roles::normalize_roles;

/// Tolerância de relógio aplicada na validação, em segundos
pub const CLOCK_SKEW_SECONDS: u64 = 30;

/// Configuração dos tokens de acesso
#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: String,
    pub access_token_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .field("access_token_minutes", &self.access_token_minutes)
            .finish()
    }
}

/// Conjunto de claims carregado pela credencial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identificador do usuário
    pub sub: Uuid,
    pub email: String,
    /// Identificador único do token
    pub jti: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

/// Token emitido e seu instante de expiração
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Emissor e validador de tokens
///
/// As chaves são carregadas uma única vez e apenas lidas depois disso,
/// então o serviço pode ser compartilhado entre requisições sem travas.
pub struct TokenService {
    issuer: String,
    audience: String,
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        if config.signing_key.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "chave de assinatura vazia".to_string(),
            ));
        }
        if config.access_token_minutes <= 0 {
            return Err(AuthError::InvalidConfiguration(
                "validade do token deve ser positiva".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_SECONDS;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Ok(Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            lifetime: Duration::minutes(config.access_token_minutes),
            encoding_key: EncodingKey::from_secret(config.signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_key.as_bytes()),
            validation,
        })
    }

    /// Emite um token válido a partir de agora
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        patient_id: Option<Uuid>,
        roles: &[String],
    ) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, email, patient_id, roles, Utc::now())
    }

    /// Emite um token como se a emissão tivesse ocorrido em `issued_at`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        patient_id: Option<Uuid>,
        roles: &[String],
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let expires_at = issued_at + self.lifetime;
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_string(),
            jti: Uuid::new_v4(),
            patient_id,
            roles: normalize_roles(roles),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Valida o token e devolve as claims.
    ///
    /// Qualquer falha resulta em `AuthError::InvalidToken`, sem detalhar o motivo.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                debug!("Token rejeitado: {:?}", e.kind());
                Err(AuthError::InvalidToken)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            issuer: "ehr-gateway".to_string(),
            audience: "ehr-clients".to_string(),
            signing_key: "chave-de-teste-com-tamanho-suficiente-1234".to_string(),
            access_token_minutes: 60,
        }
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_issue_and_validate() {
        let service = TokenService::new(&config()).unwrap();
        let user_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        let issued = service
            .issue(user_id, "pac@clinica.med.br", Some(patient_id), &roles(&["Patient", "patient"]))
            .unwrap();
        let claims = service.validate(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "pac@clinica.med.br");
        assert_eq!(claims.patient_id, Some(patient_id));
        assert_eq!(claims.roles, vec!["Patient".to_string()]);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.expires_at().unwrap().timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn test_unique_token_ids() {
        let service = TokenService::new(&config()).unwrap();
        let user_id = Uuid::new_v4();
        let a = service.issue(user_id, "a@b.c", None, &[]).unwrap();
        let b = service.issue(user_id, "a@b.c", None, &[]).unwrap();
        let ja = service.validate(&a.token).unwrap().jti;
        let jb = service.validate(&b.token).unwrap().jti;
        assert_ne!(ja, jb);
    }

    #[test]
    fn test_expiry_with_clock_skew() {
        let service = TokenService::new(&config()).unwrap();
        let lifetime = Duration::minutes(60);
        let user_id = Uuid::new_v4();

        // expirado há 20s: dentro da tolerância
        let issued_at = Utc::now() - lifetime - Duration::seconds(20);
        let tolerated = service.issue_at(user_id, "a@b.c", None, &[], issued_at).unwrap();
        assert!(service.validate(&tolerated.token).is_ok());

        // expirado há 40s: rejeitado
        let issued_at = Utc::now() - lifetime - Duration::seconds(40);
        let expired = service.issue_at(user_id, "a@b.c", None, &[], issued_at).unwrap();
        assert!(matches!(service.validate(&expired.token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_not_before_in_future_rejected() {
        let service = TokenService::new(&config()).unwrap();
        let issued_at = Utc::now() + Duration::minutes(5);
        let early = service.issue_at(Uuid::new_v4(), "a@b.c", None, &[], issued_at).unwrap();
        assert!(service.validate(&early.token).is_err());
    }

    #[test]
    fn test_wrong_issuer_audience_or_key_rejected() {
        let service = TokenService::new(&config()).unwrap();

        let other_issuer = TokenService::new(&JwtConfig { issuer: "outro".into(), ..config() }).unwrap();
        let other_audience =
            TokenService::new(&JwtConfig { audience: "outro".into(), ..config() }).unwrap();
        let other_key = TokenService::new(&JwtConfig {
            signing_key: "outra-chave-de-assinatura-qualquer-5678".into(),
            ..config()
        })
        .unwrap();

        for foreign in [other_issuer, other_audience, other_key] {
            let token = foreign.issue(Uuid::new_v4(), "a@b.c", None, &[]).unwrap();
            assert!(matches!(service.validate(&token.token), Err(AuthError::InvalidToken)));
        }

        assert!(service.validate("nao.e.jwt").is_err());
        assert!(service.validate("").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = TokenService::new(&config()).unwrap();
        let issued = service.issue(Uuid::new_v4(), "a@b.c", None, &roles(&["Nurse"])).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        let forged = service.issue(Uuid::new_v4(), "a@b.c", None, &roles(&["Admin"])).unwrap();
        parts[1] = forged.token.split('.').nth(1).unwrap().to_string();
        assert!(service.validate(&parts.join(".")).is_err());
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(TokenService::new(&JwtConfig { signing_key: " ".into(), ..config() }).is_err());
        assert!(TokenService::new(&JwtConfig { access_token_minutes: 0, ..config() }).is_err());
        assert!(!format!("{:?}", config()).contains("chave-de-teste"));
    }
}
