use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::order::{
    ListResult, OrderFilter, OrderLineInput, OrderLineView, OrderStatus, OrderView, PlaceOrder,
};
use crate::domain::order_flow::PlacedOrder;
use crate::domain::user::Identity;
use crate::errors::AppError;
use crate::Orders;

use super::auth::AdminIdentity;
use super::{default_limit, money, page};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub book_id: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub payment_method_id: String,
    pub voucher_code: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedLineResponse {
    pub book_id: String,
    pub title: String,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrderResponse {
    pub order_id: String,
    pub status: String,
    pub subtotal: String,
    pub discount: String,
    pub shipping_fee: String,
    pub total_amount: String,
    pub voucher_code: Option<String>,
    pub shipping_address: String,
    pub payment_method_id: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PlacedLineResponse>,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(o: PlacedOrder) -> Self {
        PlacedOrderResponse {
            order_id: o.order_id,
            status: o.status.to_string(),
            subtotal: money(&o.price.subtotal),
            discount: money(&o.price.discount),
            shipping_fee: money(&o.price.shipping_fee),
            total_amount: money(&o.price.total),
            voucher_code: o.voucher_code,
            shipping_address: o.shipping_address,
            payment_method_id: o.payment_method_id,
            created_at: o.created_at,
            items: o
                .lines
                .into_iter()
                .map(|l| PlacedLineResponse {
                    unit_price: money(&l.unit_price),
                    book_id: l.book_id,
                    title: l.title,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub detail_id: i32,
    pub book_id: String,
    pub title: Option<String>,
    pub cover_image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
}

impl From<OrderLineView> for OrderLineResponse {
    fn from(l: OrderLineView) -> Self {
        OrderLineResponse {
            unit_price: money(&l.unit_price),
            detail_id: l.detail_id,
            book_id: l.book_id,
            title: l.title,
            cover_image_url: l.cover_image_url,
            quantity: l.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: String,
    pub user_id: Uuid,
    pub customer_name: Option<String>,
    pub total_amount: String,
    pub status: String,
    pub shipping_address: String,
    pub payment_method_id: Option<String>,
    pub payment_method_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            total_amount: money(&o.total_amount),
            status: o.status.to_string(),
            order_id: o.order_id,
            user_id: o.user_id,
            customer_name: o.customer_name,
            shipping_address: o.shipping_address,
            payment_method_id: o.payment_method_id,
            payment_method_name: o.payment_method_name,
            created_at: o.created_at,
            items: o.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    #[serde(default)]
    pub skip: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// `processing`, `confirmed`, `shipping`, `completed` or `cancelled`.
    pub status: Option<String>,
}

impl ListOrdersParams {
    fn filter(self) -> Result<OrderFilter, AppError> {
        let (skip, limit) = page(self.skip, self.limit);
        let status = self
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        Ok(OrderFilter {
            status,
            skip,
            limit,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

fn list_response(result: ListResult, skip: i64, limit: i64) -> ListOrdersResponse {
    ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        skip,
        limit,
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub new_status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Prices, stock and the voucher are all checked inside one transaction.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = PlacedOrderResponse),
        (status = 400, description = "Invalid items, insufficient stock or bad voucher"),
        (status = 404, description = "Book or payment method not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order(
    svc: web::Data<Orders>,
    caller: Identity,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let order = PlaceOrder {
        user_id: caller.user_id,
        shipping_address: body.shipping_address,
        payment_method_id: body.payment_method_id,
        voucher_code: body.voucher_code,
        lines: body
            .items
            .into_iter()
            .map(|i| OrderLineInput {
                book_id: i.book_id,
                quantity: i.quantity,
            })
            .collect(),
    };
    let placed = web::block(move || svc.place_order(order)).await??;
    Ok(HttpResponse::Created().json(PlacedOrderResponse::from(placed)))
}

#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    params(ListOrdersParams),
    responses((status = 200, description = "Own orders, newest first", body = ListOrdersResponse)),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn my_orders(
    svc: web::Data<Orders>,
    caller: Identity,
    params: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let filter = params.into_inner().filter()?;
    let (skip, limit) = (filter.skip, filter.limit);
    let result = web::block(move || svc.list_mine(caller, &filter)).await??;
    Ok(HttpResponse::Ok().json(list_response(result, skip, limit)))
}

#[utoipa::path(
    get,
    path = "/api/orders/admin/all",
    params(ListOrdersParams),
    responses((status = 200, description = "All orders, newest first", body = ListOrdersResponse)),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn all_orders(
    svc: web::Data<Orders>,
    _admin: AdminIdentity,
    params: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let filter = params.into_inner().filter()?;
    let (skip, limit) = (filter.skip, filter.limit);
    let result = web::block(move || svc.list_all(&filter)).await??;
    Ok(HttpResponse::Ok().json(list_response(result, skip, limit)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    svc: web::Data<Orders>,
    caller: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || svc.get(caller, &id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/cancel",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled, stock restored", body = OrderResponse),
        (status = 400, description = "Order is past processing"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    svc: web::Data<Orders>,
    caller: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || svc.cancel(caller, &id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/confirm-delivery",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed", body = OrderResponse),
        (status = 400, description = "Order is not shipping"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn confirm_delivery(
    svc: web::Data<Orders>,
    caller: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || svc.confirm_delivery(caller, &id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    put,
    path = "/api/orders/admin/{id}/status",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_status(
    svc: web::Data<Orders>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let next: OrderStatus = body.new_status.parse()?;
    let order = web::block(move || svc.update_status(&id, next)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
