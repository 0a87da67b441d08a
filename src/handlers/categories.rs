//! Categories plus the two small lookup resources that hang off the catalog:
//! payment methods and discount vouchers.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::catalog::{Category, Discount, NewDiscount, PaymentMethod};
use crate::errors::AppError;
use crate::Catalog;

use super::auth::AdminIdentity;
use super::{default_limit, message, money, page, parse_money};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CategoryBody {
    pub category_id: String,
    pub category_name: String,
}

impl From<Category> for CategoryBody {
    fn from(c: Category) -> Self {
        CategoryBody {
            category_id: c.category_id,
            category_name: c.category_name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameCategoryRequest {
    pub category_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentMethodResponse {
    pub payment_method_id: String,
    pub method_name: String,
    pub description: Option<String>,
    pub status: String,
}

impl From<PaymentMethod> for PaymentMethodResponse {
    fn from(p: PaymentMethod) -> Self {
        PaymentMethodResponse {
            payment_method_id: p.payment_method_id,
            method_name: p.method_name,
            description: p.description,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub discount_id: String,
    pub voucher_code: String,
    /// Percentage as a decimal string in (0, 100], e.g. "10"
    pub discount_percentage: String,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountResponse {
    pub discount_id: String,
    pub voucher_code: String,
    pub discount_percentage: String,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Discount> for DiscountResponse {
    fn from(d: Discount) -> Self {
        DiscountResponse {
            discount_percentage: money(&d.discount_percentage),
            discount_id: d.discount_id,
            voucher_code: d.voucher_code,
            expiry_date: d.expiry_date,
            created_at: d.created_at,
        }
    }
}

// ── Categories ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/categories",
    params(CategoryListParams),
    responses((status = 200, description = "Categories", body = [CategoryBody])),
    tag = "categories"
)]
pub async fn list_categories(
    svc: web::Data<Catalog>,
    params: web::Query<CategoryListParams>,
) -> Result<HttpResponse, AppError> {
    let (skip, limit) = page(params.skip, params.limit);
    let categories = web::block(move || svc.list_categories(skip, limit)).await??;
    Ok(HttpResponse::Ok().json(
        categories
            .into_iter()
            .map(CategoryBody::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = CategoryBody),
        (status = 404, description = "Category not found"),
    ),
    tag = "categories"
)]
pub async fn get_category(
    svc: web::Data<Catalog>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let category = web::block(move || svc.get_category(&id)).await??;
    Ok(HttpResponse::Ok().json(CategoryBody::from(category)))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryBody,
    responses(
        (status = 201, description = "Category created", body = CategoryBody),
        (status = 409, description = "Id or name already used"),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    body: web::Json<CategoryBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let category = Category {
        category_id: body.category_id.trim().to_string(),
        category_name: body.category_name.trim().to_string(),
    };
    let category = web::block(move || svc.create_category(category)).await??;
    Ok(HttpResponse::Created().json(CategoryBody::from(category)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body = RenameCategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = CategoryBody),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already used"),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn rename_category(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    body: web::Json<RenameCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let name = body.into_inner().category_name;
    let category = web::block(move || svc.rename_category(&id, &name)).await??;
    Ok(HttpResponse::Ok().json(CategoryBody::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has books"),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete_category(&id)).await??;
    Ok(message("Category deleted"))
}

// ── Payment methods & discounts ──────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/payment-methods",
    responses((status = 200, description = "Active payment methods", body = [PaymentMethodResponse])),
    tag = "catalog"
)]
pub async fn list_payment_methods(svc: web::Data<Catalog>) -> Result<HttpResponse, AppError> {
    let methods = web::block(move || svc.payment_methods()).await??;
    Ok(HttpResponse::Ok().json(
        methods
            .into_iter()
            .map(PaymentMethodResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/discounts",
    responses((status = 200, description = "All vouchers", body = [DiscountResponse])),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn list_discounts(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
) -> Result<HttpResponse, AppError> {
    let discounts = web::block(move || svc.list_discounts()).await??;
    Ok(HttpResponse::Ok().json(
        discounts
            .into_iter()
            .map(DiscountResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/discounts",
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Voucher created", body = DiscountResponse),
        (status = 400, description = "Bad percentage or expiry"),
        (status = 409, description = "Code already used"),
    ),
    security(("bearer_auth" = [])),
    tag = "catalog"
)]
pub async fn create_discount(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    body: web::Json<CreateDiscountRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let discount = NewDiscount {
        discount_percentage: parse_money("discount_percentage", &body.discount_percentage)?,
        discount_id: body.discount_id.trim().to_string(),
        voucher_code: body.voucher_code.trim().to_string(),
        expiry_date: body.expiry_date,
    };
    let discount = web::block(move || svc.create_discount(discount)).await??;
    Ok(HttpResponse::Created().json(DiscountResponse::from(discount)))
}
