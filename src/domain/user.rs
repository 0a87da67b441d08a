use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::invalid(format!("unknown role '{other}'"))),
        }
    }
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(DomainError::invalid(format!("'{email}' is not a valid email")))
    }
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), DomainError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.len() < 8 || digits.len() > 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::invalid(format!("'{phone}' is not a valid phone number")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("lan@ute.edu.vn").is_ok());
        assert!(validate_email("lan.ute.edu.vn").is_err());
        assert!(validate_email("@ute.edu.vn").is_err());
        assert!(validate_email("lan@localhost").is_err());
        assert!(validate_email("l an@ute.vn").is_err());
    }

    #[test]
    fn password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn phone_digits() {
        assert!(validate_phone("0901234567").is_ok());
        assert!(validate_phone("+84901234567").is_ok());
        assert!(validate_phone("09-0123").is_err());
    }
}
