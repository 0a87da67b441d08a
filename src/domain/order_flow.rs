//! The order lifecycle: placement and status transitions.
//!
//! These functions hold the business rules and talk to storage only through
//! [`OrderStore`]. Callers run each one inside a single transaction and roll
//! back on any `Err`.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::order::{
    next_order_id, price_lines, OrderStatus, PlaceOrder, PriceBreakdown, StatusActor, Voucher,
};
use super::ports::{Customer, NewOrderRecord, OrderStore, StoredLine};

#[derive(Debug, Clone)]
pub struct PlacedLine {
    pub book_id: String,
    pub title: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: String,
    pub customer: Customer,
    pub lines: Vec<PlacedLine>,
    pub price: PriceBreakdown,
    pub voucher_code: Option<String>,
    pub shipping_address: String,
    pub payment_method_id: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order_id: String,
    pub customer: Option<Customer>,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

fn validate(order: &PlaceOrder) -> Result<(), DomainError> {
    if order.lines.is_empty() {
        return Err(DomainError::invalid("an order needs at least one item"));
    }
    if let Some(line) = order.lines.iter().find(|l| l.quantity <= 0) {
        return Err(DomainError::invalid(format!(
            "quantity for book {} must be positive",
            line.book_id
        )));
    }
    if order.shipping_address.trim().is_empty() {
        return Err(DomainError::invalid("shipping address is required"));
    }
    Ok(())
}

fn usable_voucher(
    store: &mut impl OrderStore,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Voucher, DomainError> {
    let voucher = store
        .voucher(code)?
        .ok_or_else(|| DomainError::invalid(format!("voucher '{code}' does not exist")))?;
    if !voucher.is_active_at(now) {
        return Err(DomainError::invalid(format!("voucher '{code}' has expired")));
    }
    Ok(voucher)
}

/// Validates, prices and persists a new order in the `processing` state.
///
/// Every check runs before the first write, so a rejected order leaves no
/// trace even without the surrounding rollback.
pub fn place(
    store: &mut impl OrderStore,
    order: PlaceOrder,
    now: DateTime<Utc>,
) -> Result<PlacedOrder, DomainError> {
    validate(&order)?;

    let customer = store
        .customer(order.user_id)?
        .ok_or_else(|| DomainError::not_found("User"))?;

    if !store.payment_method_exists(&order.payment_method_id)? {
        return Err(DomainError::not_found(format!(
            "Payment method {}",
            order.payment_method_id
        )));
    }

    // The same book may appear on several lines; stock covers their sum.
    let mut demand: BTreeMap<&str, i32> = BTreeMap::new();
    for line in &order.lines {
        let total = demand.entry(line.book_id.as_str()).or_default();
        *total = total.checked_add(line.quantity).ok_or_else(|| {
            DomainError::invalid(format!("quantity for book {} is too large", line.book_id))
        })?;
    }

    let mut books = BTreeMap::new();
    for (&book_id, &requested) in &demand {
        let book = store
            .book(book_id)?
            .ok_or_else(|| DomainError::not_found(format!("Book {book_id}")))?;
        if book.stock_quantity < requested {
            return Err(DomainError::InsufficientStock {
                book_id: book_id.to_string(),
                requested,
                available: book.stock_quantity,
            });
        }
        books.insert(book_id, book);
    }

    let voucher = match order.voucher_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Some(usable_voucher(store, code, now)?),
        _ => None,
    };

    let lines: Vec<PlacedLine> = order
        .lines
        .iter()
        .map(|l| {
            let book = &books[l.book_id.as_str()];
            PlacedLine {
                book_id: book.book_id.clone(),
                title: book.title.clone(),
                quantity: l.quantity,
                unit_price: book.price.clone(),
            }
        })
        .collect();

    let price = price_lines(
        lines.iter().map(|l| (&l.unit_price, l.quantity)),
        voucher.as_ref(),
    );

    let last_id = store.last_order_id()?;
    let order_id = next_order_id(last_id.as_deref());

    let record = NewOrderRecord {
        order_id: order_id.clone(),
        user_id: customer.user_id,
        total_amount: price.total.clone(),
        status: OrderStatus::Processing,
        shipping_address: order.shipping_address.trim().to_string(),
        payment_method_id: order.payment_method_id.clone(),
        created_at: now,
    };
    let stored: Vec<StoredLine> = lines
        .iter()
        .map(|l| StoredLine {
            book_id: l.book_id.clone(),
            quantity: l.quantity,
            unit_price: l.unit_price.clone(),
        })
        .collect();
    store.insert_order(&record, &stored)?;

    for (&book_id, &requested) in &demand {
        if !store.take_stock(book_id, requested)? {
            let available = store.book(book_id)?.map_or(0, |b| b.stock_quantity);
            return Err(DomainError::InsufficientStock {
                book_id: book_id.to_string(),
                requested,
                available,
            });
        }
    }

    if let Some(v) = &voucher {
        store.record_discount(&order_id, &v.discount_id)?;
    }

    Ok(PlacedOrder {
        order_id,
        customer,
        lines,
        price,
        voucher_code: voucher.map(|v| v.code),
        shipping_address: record.shipping_address,
        payment_method_id: record.payment_method_id,
        status: record.status,
        created_at: now,
    })
}

/// Moves an order along the status graph.
///
/// Cancellation returns every line's quantity to stock. Only the owning
/// customer may confirm delivery (`shipping → completed`), and customers may
/// not drive the fulfilment steps themselves.
pub fn change_status(
    store: &mut impl OrderStore,
    order_id: &str,
    next: OrderStatus,
    actor: StatusActor,
) -> Result<StatusChange, DomainError> {
    let order = store
        .order(order_id)?
        .ok_or_else(|| DomainError::not_found(format!("Order {order_id}")))?;

    match actor {
        StatusActor::Owner(user_id) => {
            if order.user_id != user_id {
                return Err(DomainError::forbidden("you do not own this order"));
            }
            if !matches!(next, OrderStatus::Cancelled | OrderStatus::Completed) {
                return Err(DomainError::forbidden(
                    "customers can only cancel or confirm delivery",
                ));
            }
        }
        StatusActor::Admin => {
            if next == OrderStatus::Completed {
                return Err(DomainError::forbidden(
                    "only the customer can confirm delivery",
                ));
            }
        }
    }

    if !order.status.can_transition_to(next) {
        return Err(DomainError::InvalidTransition {
            from: order.status,
            to: next,
        });
    }

    if next == OrderStatus::Cancelled {
        for line in store.order_lines(order_id)? {
            store.return_stock(&line.book_id, line.quantity)?;
        }
    }
    store.set_status(order_id, next)?;

    let customer = store.customer(order.user_id)?;
    Ok(StatusChange {
        order_id: order.order_id,
        customer,
        from: order.status,
        to: next,
    })
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory [`OrderStore`] with snapshot rollback, for workflow tests.

    use std::collections::HashMap;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::*;
    use crate::domain::ports::{OrderHeader, StockedBook};

    #[derive(Debug, Clone, Default)]
    pub struct Tables {
        pub customers: HashMap<Uuid, Customer>,
        pub payment_methods: Vec<String>,
        pub books: HashMap<String, (StockedBook, i32)>,
        pub vouchers: HashMap<String, Voucher>,
        pub orders: Vec<(NewOrderRecord, Vec<StoredLine>)>,
        pub discount_applications: Vec<(String, String)>,
    }

    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub tables: Tables,
        /// Units silently bought by someone else right before `take_stock`.
        pub concurrent_purchase: HashMap<String, i32>,
    }

    impl MemoryStore {
        pub fn atomically<T>(
            &mut self,
            f: impl FnOnce(&mut Self) -> Result<T, DomainError>,
        ) -> Result<T, DomainError> {
            let snapshot = self.tables.clone();
            let result = f(self);
            if result.is_err() {
                self.tables = snapshot;
            }
            result
        }

        pub fn add_customer(&mut self, name: &str) -> Uuid {
            let user_id = Uuid::new_v4();
            self.tables.customers.insert(
                user_id,
                Customer {
                    user_id,
                    full_name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                },
            );
            user_id
        }

        pub fn add_book(&mut self, book_id: &str, price: i64, stock: i32) {
            self.tables.books.insert(
                book_id.to_string(),
                (
                    StockedBook {
                        book_id: book_id.to_string(),
                        title: format!("Title of {book_id}"),
                        price: BigDecimal::from(price),
                        stock_quantity: stock,
                    },
                    0,
                ),
            );
        }

        pub fn stock(&self, book_id: &str) -> (i32, i32) {
            let (book, sold) = &self.tables.books[book_id];
            (book.stock_quantity, *sold)
        }

        pub fn status(&self, order_id: &str) -> Option<OrderStatus> {
            self.tables
                .orders
                .iter()
                .find(|(o, _)| o.order_id == order_id)
                .map(|(o, _)| o.status)
        }
    }

    impl OrderStore for MemoryStore {
        fn customer(&mut self, user_id: Uuid) -> Result<Option<Customer>, DomainError> {
            Ok(self.tables.customers.get(&user_id).cloned())
        }

        fn payment_method_exists(&mut self, id: &str) -> Result<bool, DomainError> {
            Ok(self.tables.payment_methods.iter().any(|p| p == id))
        }

        fn book(&mut self, book_id: &str) -> Result<Option<StockedBook>, DomainError> {
            Ok(self.tables.books.get(book_id).map(|(b, _)| b.clone()))
        }

        fn voucher(&mut self, code: &str) -> Result<Option<Voucher>, DomainError> {
            Ok(self.tables.vouchers.get(code).cloned())
        }

        fn last_order_id(&mut self) -> Result<Option<String>, DomainError> {
            Ok(self.tables.orders.last().map(|(o, _)| o.order_id.clone()))
        }

        fn insert_order(
            &mut self,
            order: &NewOrderRecord,
            lines: &[StoredLine],
        ) -> Result<(), DomainError> {
            self.tables.orders.push((order.clone(), lines.to_vec()));
            Ok(())
        }

        fn take_stock(&mut self, book_id: &str, quantity: i32) -> Result<bool, DomainError> {
            let stolen = self.concurrent_purchase.remove(book_id).unwrap_or(0);
            let Some((book, sold)) = self.tables.books.get_mut(book_id) else {
                return Ok(false);
            };
            book.stock_quantity -= stolen;
            if book.stock_quantity < quantity {
                return Ok(false);
            }
            book.stock_quantity -= quantity;
            *sold += quantity;
            Ok(true)
        }

        fn return_stock(&mut self, book_id: &str, quantity: i32) -> Result<(), DomainError> {
            if let Some((book, sold)) = self.tables.books.get_mut(book_id) {
                book.stock_quantity += quantity;
                *sold -= quantity;
            }
            Ok(())
        }

        fn record_discount(&mut self, order_id: &str, discount_id: &str) -> Result<(), DomainError> {
            self.tables
                .discount_applications
                .push((order_id.to_string(), discount_id.to_string()));
            Ok(())
        }

        fn order(&mut self, order_id: &str) -> Result<Option<OrderHeader>, DomainError> {
            Ok(self
                .tables
                .orders
                .iter()
                .find(|(o, _)| o.order_id == order_id)
                .map(|(o, _)| OrderHeader {
                    order_id: o.order_id.clone(),
                    user_id: o.user_id,
                    status: o.status,
                }))
        }

        fn order_lines(&mut self, order_id: &str) -> Result<Vec<StoredLine>, DomainError> {
            Ok(self
                .tables
                .orders
                .iter()
                .find(|(o, _)| o.order_id == order_id)
                .map(|(_, lines)| lines.clone())
                .unwrap_or_default())
        }

        fn set_status(&mut self, order_id: &str, status: OrderStatus) -> Result<(), DomainError> {
            if let Some((o, _)) = self
                .tables
                .orders
                .iter_mut()
                .find(|(o, _)| o.order_id == order_id)
            {
                o.status = status;
            }
            Ok(())
        }
    }
}
