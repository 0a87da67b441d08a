use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStatus {
    Pending,
    Resolved,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContactStatus::Pending),
            "resolved" => Ok(ContactStatus::Resolved),
            other => Err(DomainError::invalid(format!("unknown contact status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Contact {
    pub contact_id: i32,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub admin_response: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub status: Option<ContactStatus>,
    pub skip: i64,
    pub limit: i64,
}
