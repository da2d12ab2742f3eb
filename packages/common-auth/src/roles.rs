//! Vocabulário de papéis e comparação sem distinção de maiúsculas

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Papéis conhecidos pelo sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Patient,
    Receptionist,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Patient,
        Role::Receptionist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Patient => "Patient",
            Role::Receptionist => "Receptionist",
        }
    }

    /// Interpreta o nome de um papel, ignorando maiúsculas e espaços nas bordas
    pub fn parse(name: &str) -> Result<Self, AuthError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AuthError::InvalidRole("nome de papel vazio".to_string()));
        }
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AuthError::InvalidRole(trimmed.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remove papéis vazios e repetidos (sem distinção de maiúsculas),
/// preservando a grafia da primeira ocorrência.
pub fn normalize_roles<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique: Vec<String> = Vec::new();
    for role in roles {
        let role = role.as_ref().trim();
        if role.is_empty() {
            continue;
        }
        if !unique.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            unique.push(role.to_string());
        }
    }
    unique
}

/// Verifica se a lista contém o papel, sem distinção de maiúsculas
pub fn has_role<S: AsRef<str>>(roles: &[S], role: Role) -> bool {
    roles
        .iter()
        .any(|r| r.as_ref().trim().eq_ignore_ascii_case(role.as_str()))
}

/// Verifica se a lista contém algum dos papéis
pub fn has_any_role<S: AsRef<str>>(roles: &[S], wanted: &[Role]) -> bool {
    wanted.iter().any(|role| has_role(roles, *role))
}
