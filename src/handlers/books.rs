use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::catalog::{Book, BookChanges, BookQuery, NewBook};
use crate::errors::AppError;
use crate::Catalog;

use super::auth::AdminIdentity;
use super::{default_limit, message, money, page, parse_money};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    pub category_id: Option<String>,
    /// Case-insensitive substring of title or author.
    pub search: Option<String>,
    #[serde(default)]
    pub skip: i64,
    /// Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    /// Decimal price as a string, e.g. "85000"
    pub price: String,
    #[serde(default)]
    pub stock_quantity: i32,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    pub price: Option<String>,
    pub stock_quantity: Option<i32>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookResponse {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    pub price: String,
    pub stock_quantity: i32,
    pub sold_quantity: i32,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(b: Book) -> Self {
        BookResponse {
            price: money(&b.price),
            book_id: b.book_id,
            title: b.title,
            author: b.author,
            publisher: b.publisher,
            publication_year: b.publication_year,
            category_id: b.category_id,
            stock_quantity: b.stock_quantity,
            sold_quantity: b.sold_quantity,
            description: b.description,
            cover_image_url: b.cover_image_url,
            created_at: b.created_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/books",
    params(BookListParams),
    responses((status = 200, description = "Books", body = [BookResponse])),
    tag = "books"
)]
pub async fn list_books(
    svc: web::Data<Catalog>,
    params: web::Query<BookListParams>,
) -> Result<HttpResponse, AppError> {
    let params = params.into_inner();
    let (skip, limit) = page(params.skip, params.limit);
    let query = BookQuery {
        category_id: params.category_id,
        search: params.search,
        skip,
        limit,
    };
    let books = web::block(move || svc.list_books(&query)).await??;
    Ok(HttpResponse::Ok().json(books.into_iter().map(BookResponse::from).collect::<Vec<_>>()))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 404, description = "Book not found"),
    ),
    tag = "books"
)]
pub async fn get_book(
    svc: web::Data<Catalog>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let book = web::block(move || svc.get_book(&id)).await??;
    Ok(HttpResponse::Ok().json(BookResponse::from(book)))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Book id already used"),
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn create_book(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    body: web::Json<CreateBookRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let book = NewBook {
        price: parse_money("price", &body.price)?,
        book_id: body.book_id.trim().to_string(),
        title: body.title,
        author: body.author,
        publisher: body.publisher,
        publication_year: body.publication_year,
        category_id: body.category_id,
        stock_quantity: body.stock_quantity,
        description: body.description,
        cover_image_url: body.cover_image_url,
    };
    let book = web::block(move || svc.create_book(book)).await??;
    Ok(HttpResponse::Created().json(BookResponse::from(book)))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 404, description = "Book or category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn update_book(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    body: web::Json<UpdateBookRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = BookChanges {
        price: body
            .price
            .as_deref()
            .map(|p| parse_money("price", p))
            .transpose()?,
        title: body.title,
        author: body.author,
        publisher: body.publisher,
        publication_year: body.publication_year,
        category_id: body.category_id,
        stock_quantity: body.stock_quantity,
        description: body.description,
        cover_image_url: body.cover_image_url,
    };
    let book = web::block(move || svc.update_book(&id, changes)).await??;
    Ok(HttpResponse::Ok().json(BookResponse::from(book)))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book appears in orders"),
    ),
    security(("bearer_auth" = [])),
    tag = "books"
)]
pub async fn delete_book(
    svc: web::Data<Catalog>,
    _admin: AdminIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete_book(&id)).await??;
    Ok(message("Book deleted"))
}
