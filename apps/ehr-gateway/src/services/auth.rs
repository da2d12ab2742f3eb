//! Casos de uso de autenticação: senha, código de uso único e sessão atual
//!
//! Toda falha visível ao cliente é a mesma `AuthenticationFailure`, sem
//! revelar se o e-mail, o paciente ou o código existem.

use chrono::{DateTime, Utc};
use common_auth::roles::normalize_roles;
use common_db::models::{Patient, UserAccount};
use common_db::repo;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::{ActorContext, RequestMeta};
use crate::error::{GatewayError, GatewayResult};
use crate::services::audit::AuditAction;
use crate::state::AppState;

pub const OTP_REQUEST_MESSAGE: &str =
    "Se o paciente estiver cadastrado, um código de acesso foi enviado";

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub email: String,
    pub roles: Vec<String>,
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpRequestOutcome {
    pub message: String,
    /// Presente apenas em modo de desenvolvimento
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user_id: Option<Uuid>,
    pub email: String,
    pub roles: Vec<String>,
    pub patient_id: Option<Uuid>,
}

pub async fn login(
    state: &AppState,
    meta: RequestMeta,
    email: &str,
    password: &str,
) -> GatewayResult<AuthResponse> {
    let Some(user) = state.identity.check_password(email, password).await? else {
        let attempt = ActorContext {
            email: email.trim().to_string(),
            ..ActorContext::anonymous(meta)
        };
        state
            .audit
            .append(AuditAction::AuthLoginFail, "auth/login", &attempt, None)
            .await?;
        warn!("Falha de login");
        return Err(GatewayError::AuthenticationFailure);
    };

    let (response, actor) = open_session(state, &user, meta).await?;
    state
        .audit
        .append(AuditAction::AuthLogin, "auth/login", &actor, user.patient_id)
        .await?;
    info!("Login do usuário {}", user.id);
    Ok(response)
}

/// Localiza o paciente pelo identificador interno e, em seguida, pelo MRN
pub async fn resolve_patient(state: &AppState, patient_id_or_mrn: &str) -> GatewayResult<Option<Patient>> {
    let key = patient_id_or_mrn.trim();
    if key.is_empty() {
        return Ok(None);
    }
    if let Ok(id) = Uuid::parse_str(key) {
        if let Some(patient) = repo::patients::find_by_id(&state.pool, id).await? {
            return Ok(Some(patient));
        }
    }
    Ok(repo::patients::find_by_mrn(&state.pool, key).await?)
}

pub async fn request_otp(
    state: &AppState,
    meta: RequestMeta,
    patient_id_or_mrn: &str,
) -> GatewayResult<OtpRequestOutcome> {
    let mut outcome = OtpRequestOutcome {
        message: OTP_REQUEST_MESSAGE.to_string(),
        otp: None,
    };

    let Some(patient) = resolve_patient(state, patient_id_or_mrn).await? else {
        return Ok(outcome);
    };

    let code = state.otp.generate(patient.id).await?;
    let actor = ActorContext::anonymous(meta);
    state
        .audit
        .append(AuditAction::OtpIssue, "auth/request-otp", &actor, Some(patient.id))
        .await?;

    if state.settings.otp_expose_in_response {
        outcome.otp = Some(code);
    }
    Ok(outcome)
}

pub async fn login_with_otp(
    state: &AppState,
    meta: RequestMeta,
    patient_id_or_mrn: &str,
    code: &str,
) -> GatewayResult<AuthResponse> {
    let patient = resolve_patient(state, patient_id_or_mrn).await?;

    let mut user = None;
    if let Some(patient) = &patient {
        if state.otp.validate(patient.id, code).await? {
            user = state.identity.find_by_patient_id(patient.id).await?;
        }
    }

    let Some(user) = user else {
        let attempt = ActorContext::anonymous(meta);
        state
            .audit
            .append(
                AuditAction::AuthOtpLoginFail,
                "auth/login-otp",
                &attempt,
                patient.as_ref().map(|p| p.id),
            )
            .await?;
        warn!("Falha de login por código de uso único");
        return Err(GatewayError::AuthenticationFailure);
    };

    let (response, actor) = open_session(state, &user, meta).await?;
    state
        .audit
        .append(AuditAction::AuthOtpLogin, "auth/login-otp", &actor, user.patient_id)
        .await?;
    info!("Login por código do usuário {}", user.id);
    Ok(response)
}

pub fn me(actor: &ActorContext) -> GatewayResult<MeResponse> {
    actor.require_user_id()?;
    Ok(MeResponse {
        user_id: actor.user_id,
        email: actor.email.clone(),
        roles: actor.roles.clone(),
        patient_id: actor.patient_id,
    })
}

async fn open_session(
    state: &AppState,
    user: &UserAccount,
    meta: RequestMeta,
) -> GatewayResult<(AuthResponse, ActorContext)> {
    let roles = normalize_roles(state.identity.roles_for_user(user.id).await?);
    let issued = state.tokens.issue(user.id, &user.email, user.patient_id, &roles)?;

    let actor = ActorContext {
        user_id: Some(user.id),
        email: user.email.clone(),
        roles: roles.clone(),
        patient_id: user.patient_id,
        meta,
    };
    let response = AuthResponse {
        access_token: issued.token,
        expires_at: issued.expires_at,
        email: user.email.clone(),
        roles,
        patient_id: user.patient_id,
    };
    Ok((response, actor))
}
