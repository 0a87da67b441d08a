use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::contact_service::ContactForm;
use crate::domain::contact::{Contact, ContactQuery, ContactStatus};
use crate::domain::user::Identity;
use crate::errors::AppError;
use crate::Contacts;

use super::auth::AdminIdentity;
use super::{default_limit, message, page};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    /// Required for anonymous senders; taken from the account otherwise.
    pub full_name: Option<String>,
    /// Required for anonymous senders; taken from the account otherwise.
    pub email: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub admin_response: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// `pending` or `resolved`.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactResponse {
    pub contact_id: i32,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub admin_response: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        ContactResponse {
            contact_id: c.contact_id,
            user_id: c.user_id,
            full_name: c.full_name,
            email: c.email,
            subject: c.subject,
            message: c.message,
            status: c.status.to_string(),
            admin_response: c.admin_response,
            sent_at: c.sent_at,
            responded_at: c.responded_at,
        }
    }
}

/// POST /api/contacts
///
/// Open to anonymous callers. With a valid bearer token the sender's name
/// and email come from the account.
#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Message received", body = ContactResponse),
        (status = 400, description = "Missing fields"),
    ),
    tag = "contacts"
)]
pub async fn create_contact(
    svc: web::Data<Contacts>,
    caller: Option<Identity>,
    body: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let form = ContactForm {
        full_name: body.full_name,
        email: body.email,
        subject: body.subject,
        message: body.message,
    };
    let contact = web::block(move || svc.submit(caller, form)).await??;
    Ok(HttpResponse::Created().json(ContactResponse::from(contact)))
}

#[utoipa::path(
    get,
    path = "/api/contacts",
    params(ContactListParams),
    responses((status = 200, description = "Messages, newest first", body = [ContactResponse])),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn list_contacts(
    svc: web::Data<Contacts>,
    _admin: AdminIdentity,
    params: web::Query<ContactListParams>,
) -> Result<HttpResponse, AppError> {
    let params = params.into_inner();
    let (skip, limit) = page(params.skip, params.limit);
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ContactStatus>)
        .transpose()?;
    let query = ContactQuery {
        status,
        skip,
        limit,
    };
    let contacts = web::block(move || svc.list(&query)).await??;
    Ok(HttpResponse::Ok().json(
        contacts
            .into_iter()
            .map(ContactResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Message found", body = ContactResponse),
        (status = 404, description = "Message not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn get_contact(
    svc: web::Data<Contacts>,
    _admin: AdminIdentity,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let contact = web::block(move || svc.get(id)).await??;
    Ok(HttpResponse::Ok().json(ContactResponse::from(contact)))
}

#[utoipa::path(
    put,
    path = "/api/contacts/{id}/reply",
    params(("id" = i32, Path, description = "Contact id")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply stored, message resolved", body = ContactResponse),
        (status = 400, description = "Empty reply"),
        (status = 404, description = "Message not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn reply_contact(
    svc: web::Data<Contacts>,
    _admin: AdminIdentity,
    path: web::Path<i32>,
    body: web::Json<ReplyRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let response = body.into_inner().admin_response;
    let contact = web::block(move || svc.reply(id, &response)).await??;
    Ok(HttpResponse::Ok().json(ContactResponse::from(contact)))
}

#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = i32, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Message deleted"),
        (status = 404, description = "Message not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "contacts"
)]
pub async fn delete_contact(
    svc: web::Data<Contacts>,
    _admin: AdminIdentity,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete(id)).await??;
    Ok(message("Contact deleted"))
}
