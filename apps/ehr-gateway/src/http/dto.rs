//! Corpos de requisição validados na borda HTTP

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::services::admin::NewUserInput;
use crate::services::patients::PatientRegistration;
use crate::services::records::NewRecordInput;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    // e-mail malformado segue para o login e é auditado como falha
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(length(min = 1, max = 64))]
    pub patient_id_or_mrn: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OtpLoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub patient_id_or_mrn: String,
    #[validate(length(min = 1, max = 16))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 32))]
    pub role: String,
    pub patient_id: Option<Uuid>,
}

impl From<RegisterUserRequest> for NewUserInput {
    fn from(req: RegisterUserRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            role: req.role,
            patient_id: req.patient_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 64))]
    pub mrn: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, max = 32))]
    pub gender: String,
}

impl From<CreatePatientRequest> for PatientRegistration {
    fn from(req: CreatePatientRequest) -> Self {
        Self {
            mrn: req.mrn,
            full_name: req.full_name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            assigned_doctor_id: None,
            contact_phone: None,
            contact_email: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPatientRequest {
    #[validate(length(min = 1, max = 64))]
    pub mrn: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, max = 32))]
    pub gender: String,
    pub assigned_doctor_id: Option<Uuid>,
    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
}

impl From<RegisterPatientRequest> for PatientRegistration {
    fn from(req: RegisterPatientRequest) -> Self {
        Self {
            mrn: req.mrn,
            full_name: req.full_name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            assigned_doctor_id: req.assigned_doctor_id,
            contact_phone: req.contact_phone,
            contact_email: req.contact_email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignDoctorRequest {
    pub doctor_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConsentRequest {
    pub allow_doctors: bool,
    pub allow_nurses: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddRecordRequest {
    #[validate(length(min = 1, max = 4000))]
    pub diagnosis: String,
    #[validate(length(max = 8000))]
    pub prescriptions: String,
    #[validate(length(max = 8000))]
    pub clinical_notes: String,
}

impl From<AddRecordRequest> for NewRecordInput {
    fn from(req: AddRecordRequest) -> Self {
        Self {
            diagnosis: req.diagnosis,
            prescriptions: req.prescriptions,
            clinical_notes: req.clinical_notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetUserRoleRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 32))]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub patient_id: Option<Uuid>,
    pub take: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_user_validation() {
        let ok = RegisterUserRequest {
            email: "medico@clinica.med.br".to_string(),
            password: "Senha@123".to_string(),
            role: "Doctor".to_string(),
            patient_id: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterUserRequest {
            email: "nao-e-email".to_string(),
            password: "curta".to_string(),
            role: "".to_string(),
            patient_id: None,
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("role"));
    }

    #[test]
    fn test_login_accepts_any_email_shape() {
        let req = LoginRequest {
            email: "nao-e-email".to_string(),
            password: "x".to_string(),
        };
        assert!(req.validate().is_ok());

        let empty = LoginRequest {
            email: String::new(),
            password: "x".to_string(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_patient_registration_limits() {
        let req = RegisterPatientRequest {
            mrn: "M".repeat(65),
            full_name: "Ana Lima".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: "Female".to_string(),
            assigned_doctor_id: None,
            contact_phone: None,
            contact_email: Some("invalido".to_string()),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("mrn"));
        assert!(errors.field_errors().contains_key("contact_email"));
    }
}
