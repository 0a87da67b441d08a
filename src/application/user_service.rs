use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{
    validate_email, validate_password, validate_phone, Identity, NewUser, Role, User, UserChanges,
};
use crate::infrastructure::security::{hash_password, verify_password, TokenIssuer};

const BAD_CREDENTIALS: &str = "Incorrect email/phone or password";

#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Fields a customer may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Admin edit of any account, including role and password reset.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Turns the identity claimed by a verified token into the caller's current
/// identity. Deleted accounts fail with `Unauthorized`; the role is re-read.
pub trait IdentityResolver: Send + Sync + 'static {
    fn resolve(&self, claimed: Identity) -> Result<Identity, DomainError>;
}

pub struct UserService<U> {
    users: U,
    tokens: TokenIssuer,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: U, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        match self.users.find_by_email(email)? {
            Some(existing) if Some(existing.id) != owner => {
                Err(DomainError::conflict("Email is already registered"))
            }
            _ => Ok(()),
        }
    }

    fn ensure_phone_free(&self, phone: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        match self.users.find_by_phone(phone)? {
            Some(existing) if Some(existing.id) != owner => {
                Err(DomainError::conflict("Phone number is already registered"))
            }
            _ => Ok(()),
        }
    }

    fn create(&self, form: Registration, role: Role) -> Result<User, DomainError> {
        let full_name = form.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(DomainError::invalid("full name is required"));
        }
        let email = normalize_email(&form.email);
        validate_email(&email)?;
        validate_password(&form.password)?;
        let phone = non_blank(form.phone);
        if let Some(phone) = &phone {
            validate_phone(phone)?;
            self.ensure_phone_free(phone, None)?;
        }
        self.ensure_email_free(&email, None)?;

        let user = self.users.insert(NewUser {
            id: Uuid::new_v4(),
            full_name,
            email,
            password_hash: hash_password(&form.password)?,
            phone,
            address: non_blank(form.address),
            role,
        })?;
        log::info!("Registered {} account {}", user.role, user.id);
        Ok(user)
    }

    pub fn register(&self, form: Registration) -> Result<User, DomainError> {
        self.create(form, Role::Customer)
    }

    /// `identifier` is an email when it contains `@`, otherwise a phone number.
    pub fn login(&self, identifier: &str, password: &str) -> Result<(String, User), DomainError> {
        let identifier = identifier.trim();
        let user = if identifier.contains('@') {
            self.users.find_by_email(&normalize_email(identifier))?
        } else {
            self.users.find_by_phone(identifier)?
        };
        let user = match user {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => return Err(DomainError::Unauthorized(BAD_CREDENTIALS.to_string())),
        };
        let token = self.tokens.issue(Identity {
            user_id: user.id,
            role: user.role,
        })?;
        Ok((token, user))
    }

    pub fn get(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, DomainError> {
        self.update(
            id,
            AccountChanges {
                full_name: changes.full_name,
                phone: changes.phone,
                address: changes.address,
                ..Default::default()
            },
        )
    }

    // ── Admin ───────────────────────────────────────────────────────────────

    pub fn search(&self, search: Option<&str>, role: Option<Role>) -> Result<Vec<User>, DomainError> {
        self.users.search(search, role)
    }

    pub fn create_account(&self, form: Registration, role: Role) -> Result<User, DomainError> {
        self.create(form, role)
    }

    pub fn update(&self, id: Uuid, changes: AccountChanges) -> Result<User, DomainError> {
        let full_name = match changes.full_name {
            Some(name) if name.trim().is_empty() => {
                return Err(DomainError::invalid("full name is required"))
            }
            other => other.map(|n| n.trim().to_string()),
        };
        let email = changes.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            validate_email(email)?;
            self.ensure_email_free(email, Some(id))?;
        }
        let phone = non_blank(changes.phone);
        if let Some(phone) = &phone {
            validate_phone(phone)?;
            self.ensure_phone_free(phone, Some(id))?;
        }
        let password_hash = match changes.password {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        self.users
            .update(
                id,
                UserChanges {
                    full_name,
                    email,
                    password_hash,
                    phone,
                    address: non_blank(changes.address),
                    role: changes.role,
                },
            )?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    pub fn delete(&self, caller: Identity, id: Uuid) -> Result<(), DomainError> {
        if caller.user_id == id {
            return Err(DomainError::invalid("you cannot delete your own account"));
        }
        if !self.users.delete(id)? {
            return Err(DomainError::not_found("User"));
        }
        log::info!("User {id} deleted by {}", caller.user_id);
        Ok(())
    }
}

impl<U: UserRepository + Send + Sync + 'static> IdentityResolver for UserService<U> {
    fn resolve(&self, claimed: Identity) -> Result<Identity, DomainError> {
        let user = self
            .users
            .find_by_id(claimed.user_id)?
            .ok_or_else(|| DomainError::Unauthorized("User no longer exists".to_string()))?;
        Ok(Identity {
            user_id: user.id,
            role: user.role,
        })
    }
}
