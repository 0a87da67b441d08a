use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::contact::{Contact, ContactQuery, ContactStatus, NewContact};
use crate::domain::errors::DomainError;
use crate::domain::ports::ContactRepository;
use crate::schema::contacts;

use super::models::{ContactRow, NewContactRow};

impl TryFrom<ContactRow> for Contact {
    type Error = DomainError;

    fn try_from(r: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            status: r
                .status
                .parse()
                .map_err(|_| DomainError::Internal(format!("contact {} has status '{}'", r.contact_id, r.status)))?,
            contact_id: r.contact_id,
            user_id: r.user_id,
            full_name: r.full_name,
            email: r.email,
            subject: r.subject,
            message: r.message,
            admin_response: r.admin_response,
            sent_at: r.sent_at,
            responded_at: r.responded_at,
        })
    }
}

pub struct DieselContactRepository {
    pool: DbPool,
}

impl DieselContactRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ContactRepository for DieselContactRepository {
    fn list(&self, query: &ContactQuery) -> Result<Vec<Contact>, DomainError> {
        let mut conn = self.pool.get()?;
        let mut q = contacts::table.into_boxed();
        if let Some(status) = query.status {
            q = q.filter(contacts::status.eq(status.as_str()));
        }
        q.order((contacts::sent_at.desc(), contacts::contact_id.desc()))
            .offset(query.skip)
            .limit(query.limit)
            .select(ContactRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(Contact::try_from)
            .collect()
    }

    fn find(&self, contact_id: i32) -> Result<Option<Contact>, DomainError> {
        let mut conn = self.pool.get()?;
        contacts::table
            .find(contact_id)
            .select(ContactRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Contact::try_from)
            .transpose()
    }

    fn insert(&self, contact: NewContact) -> Result<Contact, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(contacts::table)
            .values(&NewContactRow {
                user_id: contact.user_id,
                full_name: &contact.full_name,
                email: &contact.email,
                subject: &contact.subject,
                message: &contact.message,
                status: ContactStatus::Pending.as_str(),
                sent_at: contact.sent_at,
            })
            .returning(ContactRow::as_returning())
            .get_result(&mut conn)?;
        Contact::try_from(row)
    }

    fn resolve(
        &self,
        contact_id: i32,
        response: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Contact>, DomainError> {
        let mut conn = self.pool.get()?;
        diesel::update(contacts::table.find(contact_id))
            .set((
                contacts::admin_response.eq(response),
                contacts::status.eq(ContactStatus::Resolved.as_str()),
                contacts::responded_at.eq(at),
            ))
            .returning(ContactRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .map(Contact::try_from)
            .transpose()
    }

    fn delete(&self, contact_id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(contacts::table.find(contact_id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
