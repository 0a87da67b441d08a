use bigdecimal::BigDecimal;
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::dashboard::{MonthWindow, MonthlyFigures, Overview, StatusFigures};
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::DashboardRepository;
use crate::domain::user::Role;
use crate::schema::{books, orders, users};

fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

pub struct DieselDashboardRepository {
    pool: DbPool,
}

impl DieselDashboardRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl DashboardRepository for DieselDashboardRepository {
    fn overview(&self) -> Result<Overview, DomainError> {
        let mut conn = self.pool.get()?;

        let total_users: i64 = users::table.count().get_result(&mut conn)?;
        let admins: i64 = users::table
            .filter(users::role.eq(Role::Admin.as_str()))
            .count()
            .get_result(&mut conn)?;
        let customers: i64 = users::table
            .filter(users::role.eq(Role::Customer.as_str()))
            .count()
            .get_result(&mut conn)?;

        let total_orders: i64 = orders::table.count().get_result(&mut conn)?;
        let revenue: Option<BigDecimal> = orders::table
            .filter(orders::status_id.eq(OrderStatus::Completed.code()))
            .select(sum(orders::total_amount))
            .first(&mut conn)?;

        let (total_books, stock, sold) = books::table
            .select((
                count_star(),
                sum(books::stock_quantity),
                sum(books::sold_quantity),
            ))
            .first::<(i64, Option<i64>, Option<i64>)>(&mut conn)?;

        Ok(Overview {
            total_users,
            customers,
            admins,
            total_orders,
            revenue: revenue.unwrap_or_else(zero),
            total_books,
            stock: stock.unwrap_or(0),
            sold: sold.unwrap_or(0),
        })
    }

    fn status_figures(&self, status: OrderStatus) -> Result<StatusFigures, DomainError> {
        let mut conn = self.pool.get()?;
        let (count, amount) = orders::table
            .filter(orders::status_id.eq(status.code()))
            .select((count_star(), sum(orders::total_amount)))
            .first::<(i64, Option<BigDecimal>)>(&mut conn)?;
        Ok(StatusFigures {
            count,
            amount: amount.unwrap_or_else(zero),
        })
    }

    fn monthly_figures(&self, window: &MonthWindow) -> Result<MonthlyFigures, DomainError> {
        let mut conn = self.pool.get()?;
        let in_window = || {
            orders::created_at
                .ge(window.start)
                .and(orders::created_at.lt(window.end))
        };

        let (completed, revenue) = orders::table
            .filter(in_window())
            .filter(orders::status_id.eq(OrderStatus::Completed.code()))
            .select((count_star(), sum(orders::total_amount)))
            .first::<(i64, Option<BigDecimal>)>(&mut conn)?;
        let cancelled: i64 = orders::table
            .filter(in_window())
            .filter(orders::status_id.eq(OrderStatus::Cancelled.code()))
            .count()
            .get_result(&mut conn)?;

        Ok(MonthlyFigures {
            completed,
            cancelled,
            revenue: revenue.unwrap_or_else(zero),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderLineInput, PlaceOrder, StatusActor};
    use crate::domain::ports::OrderRepository;
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::testing::{seed_book, seed_customer, setup_db};
    use chrono::{Duration, Utc};

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn figures_reflect_orders_by_status() {
        let (_container, pool) = setup_db().await;
        let user_id = seed_customer(&pool, "lan@example.com");
        seed_book(&pool, "B001", 100_000, 10);
        let orders_repo = DieselOrderRepository::new(pool.clone());
        let place = || {
            orders_repo
                .place(
                    PlaceOrder {
                        user_id,
                        shipping_address: "Huế".to_string(),
                        payment_method_id: "COD".to_string(),
                        voucher_code: None,
                        lines: vec![OrderLineInput {
                            book_id: "B001".to_string(),
                            quantity: 1,
                        }],
                    },
                    Utc::now(),
                )
                .unwrap()
                .order_id
        };
        let delivered = place();
        let cancelled = place();
        place();
        for next in [OrderStatus::Confirmed, OrderStatus::Shipping] {
            orders_repo
                .change_status(&delivered, next, StatusActor::Admin)
                .unwrap();
        }
        orders_repo
            .change_status(&delivered, OrderStatus::Completed, StatusActor::Owner(user_id))
            .unwrap();
        orders_repo
            .change_status(&cancelled, OrderStatus::Cancelled, StatusActor::Admin)
            .unwrap();

        let repo = DieselDashboardRepository::new(pool);
        let overview = repo.overview().unwrap();
        assert_eq!(overview.total_users, 1);
        assert_eq!(overview.customers, 1);
        assert_eq!(overview.total_orders, 3);
        assert_eq!(overview.revenue, BigDecimal::from(130_000));
        assert_eq!((overview.stock, overview.sold), (8, 2));

        let processing = repo.status_figures(OrderStatus::Processing).unwrap();
        assert_eq!(processing.count, 1);

        let now = Utc::now();
        let window = MonthWindow {
            label: "now".to_string(),
            start: now - Duration::days(1),
            end: now + Duration::days(1),
        };
        let month = repo.monthly_figures(&window).unwrap();
        assert_eq!((month.completed, month.cancelled), (1, 1));
        assert_eq!(month.revenue, BigDecimal::from(130_000));
    }
}
