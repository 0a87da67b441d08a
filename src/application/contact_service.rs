use chrono::Utc;

use crate::domain::contact::{Contact, ContactQuery, NewContact};
use crate::domain::errors::DomainError;
use crate::domain::ports::{ContactRepository, UserRepository};
use crate::domain::user::{validate_email, Identity};

/// A support message as submitted; name and email may be omitted by
/// signed-in users.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub subject: String,
    pub message: String,
}

fn required(field: &str, value: Option<String>) -> Result<String, DomainError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::invalid(format!("{field} is required")))
}

pub struct ContactService<C, U> {
    contacts: C,
    users: U,
}

impl<C: ContactRepository, U: UserRepository> ContactService<C, U> {
    pub fn new(contacts: C, users: U) -> Self {
        Self { contacts, users }
    }

    pub fn submit(&self, caller: Option<Identity>, form: ContactForm) -> Result<Contact, DomainError> {
        let subject = required("subject", Some(form.subject))?;
        let message = required("message", Some(form.message))?;

        let (user_id, full_name, email) = match caller {
            Some(identity) => {
                let user = self
                    .users
                    .find_by_id(identity.user_id)?
                    .ok_or_else(|| DomainError::not_found("User"))?;
                (Some(user.id), user.full_name, user.email)
            }
            None => {
                let full_name = required("full_name", form.full_name)?;
                let email = required("email", form.email)?;
                validate_email(&email)?;
                (None, full_name, email)
            }
        };

        let contact = self.contacts.insert(NewContact {
            user_id,
            full_name,
            email,
            subject,
            message,
            sent_at: Utc::now(),
        })?;
        log::info!("Contact #{} received from {}", contact.contact_id, contact.email);
        Ok(contact)
    }

    pub fn list(&self, query: &ContactQuery) -> Result<Vec<Contact>, DomainError> {
        self.contacts.list(query)
    }

    pub fn get(&self, contact_id: i32) -> Result<Contact, DomainError> {
        self.contacts
            .find(contact_id)?
            .ok_or_else(|| DomainError::not_found(format!("Contact {contact_id}")))
    }

    /// Replying again overwrites the previous response.
    pub fn reply(&self, contact_id: i32, response: &str) -> Result<Contact, DomainError> {
        let response = response.trim();
        if response.is_empty() {
            return Err(DomainError::invalid("admin_response is required"));
        }
        self.contacts
            .resolve(contact_id, response, Utc::now())?
            .ok_or_else(|| DomainError::not_found(format!("Contact {contact_id}")))
    }

    pub fn delete(&self, contact_id: i32) -> Result<(), DomainError> {
        if !self.contacts.delete(contact_id)? {
            return Err(DomainError::not_found(format!("Contact {contact_id}")));
        }
        Ok(())
    }
}
