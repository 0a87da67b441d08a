use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, OrderFilter, OrderLineView, OrderStatus, OrderView, PlaceOrder, StatusActor,
    Voucher,
};
use crate::domain::order_flow::{self, PlacedOrder, StatusChange};
use crate::domain::ports::{
    Customer, NewOrderRecord, OrderHeader, OrderRepository, OrderStore, StockedBook, StoredLine,
};
use crate::schema::{
    books, discount_applications, discounts, order_details, orders, payment_methods, users,
};

use super::models::{
    DiscountRow, NewDiscountApplicationRow, NewOrderDetailRow, NewOrderRow, OrderDetailRow,
    OrderRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::Error;
        match e {
            Error::NotFound => DomainError::not_found("Record"),
            Error::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => {
                    DomainError::conflict(format!("duplicate value: {}", info.message()))
                }
                DatabaseErrorKind::ForeignKeyViolation => DomainError::conflict(format!(
                    "record is still referenced: {}",
                    info.message()
                )),
                DatabaseErrorKind::CheckViolation => DomainError::invalid(info.message()),
                _ => DomainError::Internal(info.message().to_string()),
            },
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

pub(crate) fn status_of(code: &str) -> Result<OrderStatus, DomainError> {
    OrderStatus::from_code(code)
        .ok_or_else(|| DomainError::Internal(format!("unknown status code '{code}'")))
}

// ── Transaction-scoped store ─────────────────────────────────────────────────

/// [`OrderStore`] over a connection that is already inside a transaction.
pub struct PgOrderStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgOrderStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl OrderStore for PgOrderStore<'_> {
    fn customer(&mut self, user_id: Uuid) -> Result<Option<Customer>, DomainError> {
        let row = users::table
            .find(user_id)
            .select((users::id, users::full_name, users::email))
            .first::<(Uuid, String, String)>(self.conn)
            .optional()?;
        Ok(row.map(|(user_id, full_name, email)| Customer {
            user_id,
            full_name,
            email,
        }))
    }

    fn payment_method_exists(&mut self, payment_method_id: &str) -> Result<bool, DomainError> {
        let found = diesel::select(exists(
            payment_methods::table
                .filter(payment_methods::payment_method_id.eq(payment_method_id))
                .filter(payment_methods::status.eq("active")),
        ))
        .get_result::<bool>(self.conn)?;
        Ok(found)
    }

    fn book(&mut self, book_id: &str) -> Result<Option<StockedBook>, DomainError> {
        let row = books::table
            .find(book_id)
            .select((
                books::book_id,
                books::title,
                books::price,
                books::stock_quantity,
            ))
            .first::<(String, String, BigDecimal, i32)>(self.conn)
            .optional()?;
        Ok(row.map(|(book_id, title, price, stock_quantity)| StockedBook {
            book_id,
            title,
            price,
            stock_quantity,
        }))
    }

    fn voucher(&mut self, code: &str) -> Result<Option<Voucher>, DomainError> {
        let row = discounts::table
            .filter(discounts::voucher_code.eq(code))
            .select(DiscountRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(|d| Voucher {
            discount_id: d.discount_id,
            code: d.voucher_code,
            percentage: d.discount_percentage,
            expires_at: d.expiry_date,
        }))
    }

    /// Ids share a prefix, so among rows with the same timestamp the longer
    /// id is the larger number.
    fn last_order_id(&mut self) -> Result<Option<String>, DomainError> {
        let id = orders::table
            .select(orders::order_id)
            .order((
                orders::created_at.desc(),
                diesel::dsl::sql::<diesel::sql_types::Integer>("length(orders.order_id)").desc(),
                orders::order_id.desc(),
            ))
            .first::<String>(self.conn)
            .optional()?;
        Ok(id)
    }

    fn insert_order(
        &mut self,
        order: &NewOrderRecord,
        lines: &[StoredLine],
    ) -> Result<(), DomainError> {
        diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                order_id: &order.order_id,
                user_id: order.user_id,
                total_amount: &order.total_amount,
                status_id: order.status.code(),
                shipping_address: &order.shipping_address,
                payment_method_id: Some(order.payment_method_id.as_str()),
                created_at: order.created_at,
                updated_at: order.created_at,
            })
            .execute(self.conn)?;

        let details: Vec<NewOrderDetailRow> = lines
            .iter()
            .map(|l| NewOrderDetailRow {
                order_id: &order.order_id,
                book_id: &l.book_id,
                quantity: l.quantity,
                unit_price: &l.unit_price,
            })
            .collect();
        diesel::insert_into(order_details::table)
            .values(&details)
            .execute(self.conn)?;
        Ok(())
    }

    fn take_stock(&mut self, book_id: &str, quantity: i32) -> Result<bool, DomainError> {
        let updated = diesel::update(
            books::table
                .filter(books::book_id.eq(book_id))
                .filter(books::stock_quantity.ge(quantity)),
        )
        .set((
            books::stock_quantity.eq(books::stock_quantity - quantity),
            books::sold_quantity.eq(books::sold_quantity + quantity),
        ))
        .execute(self.conn)?;
        Ok(updated == 1)
    }

    fn return_stock(&mut self, book_id: &str, quantity: i32) -> Result<(), DomainError> {
        diesel::update(books::table.find(book_id))
            .set((
                books::stock_quantity.eq(books::stock_quantity + quantity),
                books::sold_quantity.eq(books::sold_quantity - quantity),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn record_discount(&mut self, order_id: &str, discount_id: &str) -> Result<(), DomainError> {
        diesel::insert_into(discount_applications::table)
            .values(&NewDiscountApplicationRow {
                order_id,
                discount_id,
            })
            .execute(self.conn)?;
        Ok(())
    }

    fn order(&mut self, order_id: &str) -> Result<Option<OrderHeader>, DomainError> {
        // Row lock serialises concurrent transitions of the same order.
        let row = orders::table
            .find(order_id)
            .select((orders::order_id, orders::user_id, orders::status_id))
            .for_update()
            .first::<(String, Uuid, String)>(self.conn)
            .optional()?;
        row.map(|(order_id, user_id, code)| {
            Ok(OrderHeader {
                order_id,
                user_id,
                status: status_of(&code)?,
            })
        })
        .transpose()
    }

    fn order_lines(&mut self, order_id: &str) -> Result<Vec<StoredLine>, DomainError> {
        let rows = order_details::table
            .filter(order_details::order_id.eq(order_id))
            .select(OrderDetailRow::as_select())
            .load(self.conn)?;
        Ok(rows
            .into_iter()
            .map(|d| StoredLine {
                book_id: d.book_id,
                quantity: d.quantity,
                unit_price: d.unit_price,
            })
            .collect())
    }

    fn set_status(&mut self, order_id: &str, status: OrderStatus) -> Result<(), DomainError> {
        diesel::update(orders::table.find(order_id))
            .set((
                orders::status_id.eq(status.code()),
                orders::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)?;
        Ok(())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Attaches lines, customer names and payment method names to order rows.
fn assemble(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<OrderView>, DomainError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<String> = rows.iter().map(|o| o.order_id.clone()).collect();
    let user_ids: Vec<Uuid> = rows.iter().map(|o| o.user_id).collect();

    let details = order_details::table
        .inner_join(books::table)
        .filter(order_details::order_id.eq_any(order_ids))
        .order(order_details::detail_id.asc())
        .select((
            OrderDetailRow::as_select(),
            books::title,
            books::cover_image_url,
        ))
        .load::<(OrderDetailRow, String, Option<String>)>(conn)?;
    let mut lines: HashMap<String, Vec<OrderLineView>> = HashMap::new();
    for (d, title, cover_image_url) in details {
        lines.entry(d.order_id).or_default().push(OrderLineView {
            detail_id: d.detail_id,
            book_id: d.book_id,
            title: Some(title),
            cover_image_url,
            quantity: d.quantity,
            unit_price: d.unit_price,
        });
    }

    let names: HashMap<Uuid, String> = users::table
        .filter(users::id.eq_any(user_ids))
        .select((users::id, users::full_name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let methods: HashMap<String, String> = payment_methods::table
        .select((payment_methods::payment_method_id, payment_methods::method_name))
        .load::<(String, String)>(conn)?
        .into_iter()
        .collect();

    rows.into_iter()
        .map(|o| {
            Ok(OrderView {
                status: status_of(&o.status_id)?,
                customer_name: names.get(&o.user_id).cloned(),
                payment_method_name: o
                    .payment_method_id
                    .as_ref()
                    .and_then(|id| methods.get(id).cloned()),
                lines: lines.remove(&o.order_id).unwrap_or_default(),
                order_id: o.order_id,
                user_id: o.user_id,
                total_amount: o.total_amount,
                shipping_address: o.shipping_address,
                payment_method_id: o.payment_method_id,
                created_at: o.created_at,
            })
        })
        .collect()
}

fn list_page(
    conn: &mut PgConnection,
    user_id: Option<Uuid>,
    filter: &OrderFilter,
) -> Result<ListResult, DomainError> {
    let scoped = || {
        let mut query = orders::table.into_boxed();
        if let Some(user_id) = user_id {
            query = query.filter(orders::user_id.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(orders::status_id.eq(status.code()));
        }
        query
    };

    let total: i64 = scoped().count().get_result(conn)?;
    let rows = scoped()
        .order((orders::created_at.desc(), orders::order_id.desc()))
        .offset(filter.skip)
        .limit(filter.limit)
        .select(OrderRow::as_select())
        .load(conn)?;

    Ok(ListResult {
        items: assemble(conn, rows)?,
        total,
    })
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, order: PlaceOrder, now: DateTime<Utc>) -> Result<PlacedOrder, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            order_flow::place(&mut PgOrderStore::new(conn), order, now)
        })
    }

    fn change_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        actor: StatusActor,
    ) -> Result<StatusChange, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            order_flow::change_status(&mut PgOrderStore::new(conn), order_id, next, actor)
        })
    }

    fn find_by_id(&self, order_id: &str) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(order_id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };
        Ok(assemble(&mut conn, vec![order])?.pop())
    }

    fn list_for_user(&self, user_id: Uuid, filter: &OrderFilter) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;
        list_page(&mut conn, Some(user_id), filter)
    }

    fn list_all(&self, filter: &OrderFilter) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;
        list_page(&mut conn, None, filter)
    }
}
