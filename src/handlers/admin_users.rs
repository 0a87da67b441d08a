use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::user_service::{AccountChanges, Registration};
use crate::domain::user::Role;
use crate::errors::AppError;
use crate::Users;

use super::auth::AdminIdentity;
use super::message;
use super::users::UserResponse;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchParams {
    /// Case-insensitive substring of name, email or phone.
    pub search: Option<String>,
    /// `customer` or `admin`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Defaults to `customer`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    /// Resets the password when present.
    pub password: Option<String>,
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, AppError> {
    Ok(raw.map(str::parse::<Role>).transpose()?)
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserSearchParams),
    responses((status = 200, description = "Matching users", body = [UserResponse])),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(
    svc: web::Data<Users>,
    _admin: AdminIdentity,
    params: web::Query<UserSearchParams>,
) -> Result<HttpResponse, AppError> {
    let UserSearchParams { search, role } = params.into_inner();
    let role = parse_role(role.as_deref())?;
    let users = web::block(move || svc.search(search.as_deref(), role)).await??;
    Ok(HttpResponse::Ok().json(users.into_iter().map(UserResponse::from).collect::<Vec<_>>()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email or phone already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_user(
    svc: web::Data<Users>,
    _admin: AdminIdentity,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let role = parse_role(body.role.as_deref())?.unwrap_or(Role::Customer);
    let form = Registration {
        full_name: body.full_name,
        email: body.email,
        password: body.password,
        phone: body.phone,
        address: body.address,
    };
    let user = web::block(move || svc.create_account(form, role)).await??;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn get_user(
    svc: web::Data<Users>,
    _admin: AdminIdentity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user = web::block(move || svc.get(id)).await??;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_user(
    svc: web::Data<Users>,
    _admin: AdminIdentity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = AccountChanges {
        role: parse_role(body.role.as_deref())?,
        full_name: body.full_name,
        email: body.email,
        phone: body.phone,
        address: body.address,
        password: body.password,
    };
    let user = web::block(move || svc.update(id, changes)).await??;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_user(
    svc: web::Data<Users>,
    admin: AdminIdentity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete(admin.0, id)).await??;
    Ok(message("User deleted"))
}
