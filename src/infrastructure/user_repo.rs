use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{NewUser, Role, User, UserChanges};
use crate::schema::users;

use super::models::{NewUserRow, UserChangeset, UserRow};

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| DomainError::Internal(format!("user {} has role '{}'", row.id, row.role)))?;
        Ok(User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            address: row.address,
            role,
            created_at: row.created_at,
        })
    }
}

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for DieselUserRepository {
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        users::table
            .filter(users::phone.eq(phone))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn insert(&self, user: NewUser) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: user.id,
                full_name: &user.full_name,
                email: &user.email,
                password_hash: &user.password_hash,
                phone: user.phone.as_deref(),
                address: user.address.as_deref(),
                role: user.role.as_str(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)?;
        User::try_from(row)
    }

    fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DomainError> {
        let changeset = UserChangeset {
            full_name: changes.full_name.as_deref(),
            email: changes.email.as_deref(),
            password_hash: changes.password_hash.as_deref(),
            phone: changes.phone.as_deref(),
            address: changes.address.as_deref(),
            role: changes.role.map(Role::as_str),
        };
        if changeset.is_empty() {
            return self.find_by_id(id);
        }

        let mut conn = self.pool.get()?;
        diesel::update(users::table.find(id))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(User::try_from)
            .transpose()
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(users::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn search(&self, search: Option<&str>, role: Option<Role>) -> Result<Vec<User>, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = users::table.into_boxed();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            query = query.filter(
                users::full_name
                    .ilike(pattern.clone())
                    .or(users::email.ilike(pattern.clone()))
                    .or(users::phone.ilike(pattern)),
            );
        }
        if let Some(role) = role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        query
            .order(users::created_at.desc())
            .select(UserRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}
