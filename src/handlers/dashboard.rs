//! Admin dashboard figures. Revenue only counts completed orders.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::dashboard::{MonthWindow, MonthlyFigures, Overview};
use crate::errors::AppError;
use crate::Dashboard;

use super::auth::AdminIdentity;
use super::money;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStats {
    pub total: i64,
    pub customers: i64,
    pub admins: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStats {
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueStats {
    pub total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookStats {
    pub total: i64,
    pub stock: i64,
    pub sold: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub users: UserStats,
    pub orders: OrderStats,
    pub revenue: RevenueStats,
    pub books: BookStats,
}

impl From<Overview> for StatsResponse {
    fn from(o: Overview) -> Self {
        StatsResponse {
            users: UserStats {
                total: o.total_users,
                customers: o.customers,
                admins: o.admins,
            },
            orders: OrderStats {
                total: o.total_orders,
            },
            revenue: RevenueStats {
                total: money(&o.revenue),
            },
            books: BookStats {
                total: o.total_books,
                stock: o.stock,
                sold: o.sold,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusBreakdown {
    pub status: String,
    pub count: i64,
    pub amount: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendParams {
    /// Number of full months before the current one. Defaults to 5, clamped to 1..=24.
    pub months: Option<u32>,
}

/// Parallel series, one entry per month, oldest first.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct TrendsResponse {
    pub labels: Vec<String>,
    pub completed: Vec<i64>,
    pub cancelled: Vec<i64>,
    pub revenue: Vec<String>,
}

impl FromIterator<(MonthWindow, MonthlyFigures)> for TrendsResponse {
    fn from_iter<I: IntoIterator<Item = (MonthWindow, MonthlyFigures)>>(iter: I) -> Self {
        let mut out = TrendsResponse::default();
        for (window, figures) in iter {
            out.labels.push(window.label);
            out.completed.push(figures.completed);
            out.cancelled.push(figures.cancelled);
            out.revenue.push(money(&figures.revenue));
        }
        out
    }
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses((status = 200, description = "Store totals", body = StatsResponse)),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn stats(
    svc: web::Data<Dashboard>,
    _admin: AdminIdentity,
) -> Result<HttpResponse, AppError> {
    let overview = web::block(move || svc.overview()).await??;
    Ok(HttpResponse::Ok().json(StatsResponse::from(overview)))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/order-status",
    responses((status = 200, description = "Count and amount per status", body = [StatusBreakdown])),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn order_status(
    svc: web::Data<Dashboard>,
    _admin: AdminIdentity,
) -> Result<HttpResponse, AppError> {
    let rows = web::block(move || svc.by_status()).await??;
    let body: Vec<StatusBreakdown> = rows
        .into_iter()
        .map(|(status, figures)| StatusBreakdown {
            status: status.to_string(),
            count: figures.count,
            amount: money(&figures.amount),
        })
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/monthly-trends",
    params(TrendParams),
    responses((status = 200, description = "Monthly series", body = TrendsResponse)),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn monthly_trends(
    svc: web::Data<Dashboard>,
    _admin: AdminIdentity,
    params: web::Query<TrendParams>,
) -> Result<HttpResponse, AppError> {
    let months = params.months;
    let trends = web::block(move || svc.monthly_trends(months, Utc::now())).await??;
    Ok(HttpResponse::Ok().json(trends.into_iter().collect::<TrendsResponse>()))
}
