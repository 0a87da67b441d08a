use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::user_service::{ProfileChanges, Registration};
use crate::domain::user::{Identity, User};
use crate::errors::AppError;
use crate::Users;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    /// At least 6 characters.
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(r: RegisterRequest) -> Self {
        Registration {
            full_name: r.full_name,
            email: r.email,
            password: r.password,
            phone: r.phone,
            address: r.address,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address, or phone number when it has no `@`.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            phone: u.phone,
            address: u.address,
            role: u.role.to_string(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/users/register
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or phone already registered"),
    ),
    tag = "users"
)]
pub async fn register(
    svc: web::Data<Users>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let form = Registration::from(body.into_inner());
    let user = web::block(move || svc.register(form)).await??;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /api/users/login
///
/// Unknown accounts and wrong passwords get the same 401 message.
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Bad credentials"),
    ),
    tag = "users"
)]
pub async fn login(
    svc: web::Data<Users>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest {
        identifier,
        password,
    } = body.into_inner();
    let (token, user) = web::block(move || svc.login(&identifier, &password)).await??;
    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}

/// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Own profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me(svc: web::Data<Users>, caller: Identity) -> Result<HttpResponse, AppError> {
    let user = web::block(move || svc.get(caller.user_id)).await??;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PUT /api/users/me
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 409, description = "Phone already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_me(
    svc: web::Data<Users>,
    caller: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let changes = ProfileChanges {
        full_name: body.full_name,
        phone: body.phone,
        address: body.address,
    };
    let user = web::block(move || svc.update_profile(caller.user_id, changes)).await??;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
