//! Identidade do solicitante como valor explícito
//!
//! Cada operação recebe um `ActorContext` montado a partir das claims já
//! validadas, em vez de consultar estado compartilhado.

use common_auth::roles::{has_any_role, has_role};
use common_auth::{Role, SessionClaims};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};

/// Metadados de transporte registrados na auditoria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: String,
}

/// Portões de papel aplicados por rota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGate {
    AdminOnly,
    /// Médico, enfermeiro ou administrador
    ClinicalStaff,
    DoctorOnly,
    PatientOnly,
    /// Administrador ou recepção
    FrontDesk,
}

impl RoleGate {
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            RoleGate::AdminOnly => &[Role::Admin],
            RoleGate::ClinicalStaff => &[Role::Doctor, Role::Nurse, Role::Admin],
            RoleGate::DoctorOnly => &[Role::Doctor],
            RoleGate::PatientOnly => &[Role::Patient],
            RoleGate::FrontDesk => &[Role::Admin, Role::Receptionist],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Option<Uuid>,
    pub email: String,
    pub roles: Vec<String>,
    pub patient_id: Option<Uuid>,
    pub meta: RequestMeta,
}

impl ActorContext {
    /// Solicitante ainda não autenticado (login, OTP)
    pub fn anonymous(meta: RequestMeta) -> Self {
        Self {
            user_id: None,
            email: String::new(),
            roles: Vec::new(),
            patient_id: None,
            meta,
        }
    }

    pub fn from_claims(claims: &SessionClaims, meta: RequestMeta) -> Self {
        Self {
            user_id: Some(claims.sub),
            email: claims.email.clone(),
            roles: claims.roles.clone(),
            patient_id: claims.patient_id,
            meta,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        has_role(&self.roles, role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Verificação grossa, por rota
    pub fn require(&self, gate: RoleGate) -> GatewayResult<()> {
        if self.user_id.is_none() {
            return Err(GatewayError::AuthenticationFailure);
        }
        if has_any_role(&self.roles, gate.allowed_roles()) {
            Ok(())
        } else {
            Err(GatewayError::AuthorizationDenied(format!(
                "papéis {:?} não atendem {:?}",
                self.roles, gate
            )))
        }
    }

    pub fn require_user_id(&self) -> GatewayResult<Uuid> {
        self.user_id.ok_or(GatewayError::AuthenticationFailure)
    }

    /// Paciente vinculado à conta; contas sem vínculo não acessam o portal
    pub fn require_patient_id(&self) -> GatewayResult<Uuid> {
        self.patient_id.ok_or_else(|| {
            GatewayError::AuthorizationDenied("conta sem paciente vinculado".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: &[&str]) -> ActorContext {
        ActorContext {
            user_id: Some(Uuid::new_v4()),
            email: "u@clinica.med.br".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            patient_id: None,
            meta: RequestMeta::default(),
        }
    }

    #[test]
    fn test_role_gates() {
        assert!(actor(&["nurse"]).require(RoleGate::ClinicalStaff).is_ok());
        assert!(actor(&["Admin"]).require(RoleGate::ClinicalStaff).is_ok());
        assert!(actor(&["Receptionist"]).require(RoleGate::ClinicalStaff).is_err());
        assert!(actor(&["Receptionist"]).require(RoleGate::FrontDesk).is_ok());
        assert!(actor(&["Nurse"]).require(RoleGate::DoctorOnly).is_err());
        assert!(actor(&["Admin"]).require(RoleGate::PatientOnly).is_err());
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let anon = ActorContext::anonymous(RequestMeta::default());
        assert!(matches!(
            anon.require(RoleGate::PatientOnly),
            Err(GatewayError::AuthenticationFailure)
        ));
        assert!(anon.require_user_id().is_err());
    }

    #[test]
    fn test_patient_link_required() {
        let mut patient = actor(&["Patient"]);
        assert!(matches!(
            patient.require_patient_id(),
            Err(GatewayError::AuthorizationDenied(_))
        ));
        let id = Uuid::new_v4();
        patient.patient_id = Some(id);
        assert_eq!(patient.require_patient_id().unwrap(), id);
    }
}
