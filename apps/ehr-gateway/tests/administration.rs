mod common;

use anyhow::Result;
use common_auth::Role;
use uuid::Uuid;

use ehr_gateway::context::RequestMeta;
use ehr_gateway::error::GatewayError;
use ehr_gateway::services::admin::{self, NewUserInput};
use ehr_gateway::services::{auth, patients};

use common::{Harness, PASSWORD};

#[tokio::test]
async fn test_duplicate_mrn_rejected() -> Result<()> {
    let h = Harness::new().await?;
    let admin = h.admin().await?;
    h.register_patient(&admin, "P300").await?;

    let duplicate = h.register_patient(&admin, " P300 ").await;
    assert!(matches!(duplicate, Err(GatewayError::ValidationFailure(_))));
    Ok(())
}

#[tokio::test]
async fn test_assign_doctor_requires_doctor_role() -> Result<()> {
    let h = Harness::new().await?;
    let reception = h.user("recepcao@clinica.med.br", Role::Receptionist, None).await?;
    let doctor = h.user("medico@clinica.med.br", Role::Doctor, None).await?;
    let nurse = h.user("enf@clinica.med.br", Role::Nurse, None).await?;
    let patient = h.register_patient(&reception, "P301").await?;

    let nurse_id = nurse.user_id.unwrap_or_default();
    let wrong = patients::assign_doctor(&h.state, &reception, patient.id, nurse_id).await;
    assert!(matches!(wrong, Err(GatewayError::ValidationFailure(_))));

    let missing = patients::assign_doctor(&h.state, &reception, Uuid::new_v4(), nurse_id).await;
    assert!(matches!(missing, Err(GatewayError::NotFound(_))));

    let doctor_id = doctor.user_id.unwrap_or_default();
    patients::assign_doctor(&h.state, &reception, patient.id, doctor_id).await?;

    let assigned = patients::patients_by_doctor(&h.state, &reception, doctor_id).await?;
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].assigned_doctor_email.as_deref(), Some("medico@clinica.med.br"));

    let doctors = patients::list_doctors(&h.state, &reception).await?;
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, doctor_id);

    // médico não tem acesso às rotas da recepção
    let denied = patients::list_patients(&h.state, &doctor).await;
    assert!(matches!(denied, Err(GatewayError::AuthorizationDenied(_))));
    Ok(())
}

#[tokio::test]
async fn test_register_user_and_set_role() -> Result<()> {
    let h = Harness::new().await?;
    let admin = h.admin().await?;

    let missing_patient = admin::register_user(
        &h.state,
        &admin,
        NewUserInput {
            email: "pac@paciente.com".to_string(),
            password: PASSWORD.to_string(),
            role: "Patient".to_string(),
            patient_id: Some(Uuid::new_v4()),
        },
    )
    .await;
    assert!(matches!(missing_patient, Err(GatewayError::ValidationFailure(_))));

    let created = admin::register_user(
        &h.state,
        &admin,
        NewUserInput {
            email: "enf@clinica.med.br".to_string(),
            password: PASSWORD.to_string(),
            role: "nurse".to_string(),
            patient_id: None,
        },
    )
    .await?;
    assert_eq!(created.roles, vec!["Nurse"]);

    admin::set_user_role(&h.state, &admin, "enf@clinica.med.br", "Doctor").await?;
    let roles = h.state.identity.roles_for_user(created.id).await?;
    assert_eq!(roles, vec!["Doctor"]);

    let unknown = admin::set_user_role(&h.state, &admin, "ninguem@clinica.med.br", "Doctor").await;
    assert!(matches!(unknown, Err(GatewayError::NotFound(_))));

    let (_, nurse_turned_doctor) = h.login("enf@clinica.med.br").await?;
    let denied = admin::list_users(&h.state, &nurse_turned_doctor).await;
    assert!(matches!(denied, Err(GatewayError::AuthorizationDenied(_))));
    Ok(())
}

#[tokio::test]
async fn test_audit_log_filter_and_self_audit() -> Result<()> {
    let h = Harness::new().await?;
    let admin = h.admin().await?;
    let first = h.register_patient(&admin, "P310").await?;
    h.register_patient(&admin, "P311").await?;

    let entries = admin::audit_logs(&h.state, &admin, Some(first.id), None).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "PATIENT_REGISTER");
    assert_eq!(entries[0].patient_id, Some(first.id));

    let limited = admin::audit_logs(&h.state, &admin, None, Some(2)).await?;
    assert_eq!(limited.len(), 2);
    // a consulta anterior já está na trilha
    assert_eq!(limited[0].action, "AUDITLOG_READ");
    Ok(())
}

#[tokio::test]
async fn test_failed_otp_login_is_audited() -> Result<()> {
    let h = Harness::new().await?;
    let admin = h.admin().await?;
    let patient = h.register_patient(&admin, "P320").await?;
    h.user("pac@paciente.com", Role::Patient, Some(patient.id)).await?;

    let wrong = auth::login_with_otp(&h.state, RequestMeta::default(), "P320", "000000").await;
    assert!(matches!(wrong, Err(GatewayError::AuthenticationFailure)));

    let unknown = auth::login_with_otp(&h.state, RequestMeta::default(), "P999", "123456").await;
    assert!(matches!(unknown, Err(GatewayError::AuthenticationFailure)));

    let entries = h.state.audit.query(None, 2).await?;
    assert!(entries.iter().all(|e| e.action == "AUTH_OTP_LOGIN_FAIL"));
    assert_eq!(entries[0].patient_id, None);
    assert_eq!(entries[1].patient_id, Some(patient.id));

    let issued = auth::request_otp(&h.state, RequestMeta::default(), &patient.id.to_string()).await?;
    let code = issued.otp.unwrap_or_default();
    let session = auth::login_with_otp(&h.state, RequestMeta::default(), "P320", &code).await?;
    assert_eq!(session.patient_id, Some(patient.id));
    assert_eq!(session.roles, vec!["Patient"]);
    Ok(())
}
