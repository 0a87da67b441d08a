use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::catalog::{
    Book, BookChanges, BookQuery, Category, Discount, NewBook, NewDiscount, PaymentMethod,
};
use super::contact::{Contact, ContactQuery, NewContact};
use super::dashboard::{MonthWindow, MonthlyFigures, Overview, StatusFigures};
use super::errors::DomainError;
use super::notification::Email;
use super::order::{
    ListResult, OrderFilter, OrderStatus, OrderView, PlaceOrder, StatusActor, Voucher,
};
use super::order_flow::{PlacedOrder, StatusChange};
use super::review::{NewReview, RatingSummary, Review, ReviewChanges};
use super::user::{NewUser, Role, User, UserChanges};

// ── Transaction-scoped store used by the order workflow ──────────────────────

#[derive(Debug, Clone)]
pub struct Customer {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct StockedBook {
    pub book_id: String,
    pub title: String,
    pub price: BigDecimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrderRecord {
    pub order_id: String,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderHeader {
    pub order_id: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredLine {
    pub book_id: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Reads and writes the order workflow performs. Every call made during one
/// workflow step runs inside the same database transaction.
pub trait OrderStore {
    fn customer(&mut self, user_id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn payment_method_exists(&mut self, payment_method_id: &str) -> Result<bool, DomainError>;
    fn book(&mut self, book_id: &str) -> Result<Option<StockedBook>, DomainError>;
    fn voucher(&mut self, code: &str) -> Result<Option<Voucher>, DomainError>;
    fn last_order_id(&mut self) -> Result<Option<String>, DomainError>;
    fn insert_order(
        &mut self,
        order: &NewOrderRecord,
        lines: &[StoredLine],
    ) -> Result<(), DomainError>;
    /// Atomically moves `quantity` from stock to sold. Returns `false` when
    /// the book no longer has enough stock.
    fn take_stock(&mut self, book_id: &str, quantity: i32) -> Result<bool, DomainError>;
    fn return_stock(&mut self, book_id: &str, quantity: i32) -> Result<(), DomainError>;
    fn record_discount(&mut self, order_id: &str, discount_id: &str) -> Result<(), DomainError>;
    fn order(&mut self, order_id: &str) -> Result<Option<OrderHeader>, DomainError>;
    fn order_lines(&mut self, order_id: &str) -> Result<Vec<StoredLine>, DomainError>;
    fn set_status(&mut self, order_id: &str, status: OrderStatus) -> Result<(), DomainError>;
}

// ── Repositories ─────────────────────────────────────────────────────────────

pub trait OrderRepository: Send + Sync + 'static {
    fn place(&self, order: PlaceOrder, now: DateTime<Utc>) -> Result<PlacedOrder, DomainError>;
    fn change_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        actor: StatusActor,
    ) -> Result<StatusChange, DomainError>;
    fn find_by_id(&self, order_id: &str) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: Uuid, filter: &OrderFilter) -> Result<ListResult, DomainError>;
    fn list_all(&self, filter: &OrderFilter) -> Result<ListResult, DomainError>;
}

pub trait UserRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError>;
    fn insert(&self, user: NewUser) -> Result<User, DomainError>;
    fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn search(&self, search: Option<&str>, role: Option<Role>) -> Result<Vec<User>, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>, DomainError>;
    fn find_book(&self, book_id: &str) -> Result<Option<Book>, DomainError>;
    fn insert_book(&self, book: NewBook) -> Result<Book, DomainError>;
    fn update_book(&self, book_id: &str, changes: BookChanges) -> Result<Option<Book>, DomainError>;
    fn delete_book(&self, book_id: &str) -> Result<bool, DomainError>;

    fn list_categories(&self, skip: i64, limit: i64) -> Result<Vec<Category>, DomainError>;
    fn find_category(&self, category_id: &str) -> Result<Option<Category>, DomainError>;
    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, DomainError>;
    fn insert_category(&self, category: Category) -> Result<Category, DomainError>;
    fn rename_category(&self, category_id: &str, name: &str) -> Result<Option<Category>, DomainError>;
    fn count_books_in_category(&self, category_id: &str) -> Result<i64, DomainError>;
    fn delete_category(&self, category_id: &str) -> Result<bool, DomainError>;

    fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>, DomainError>;

    fn list_discounts(&self) -> Result<Vec<Discount>, DomainError>;
    fn insert_discount(&self, discount: NewDiscount) -> Result<Discount, DomainError>;
}

pub trait ReviewRepository: Send + Sync + 'static {
    fn list_for_book(&self, book_id: &str) -> Result<Vec<Review>, DomainError>;
    fn summary(&self, book_id: &str) -> Result<RatingSummary, DomainError>;
    fn book_exists(&self, book_id: &str) -> Result<bool, DomainError>;
    /// True when the user has a non-cancelled order containing the book.
    fn has_purchased(&self, user_id: Uuid, book_id: &str) -> Result<bool, DomainError>;
    fn find(&self, review_id: i32) -> Result<Option<Review>, DomainError>;
    fn find_by_author(&self, user_id: Uuid, book_id: &str) -> Result<Option<Review>, DomainError>;
    fn insert(&self, review: NewReview) -> Result<Review, DomainError>;
    fn update(&self, review_id: i32, changes: ReviewChanges) -> Result<Review, DomainError>;
    fn delete(&self, review_id: i32) -> Result<bool, DomainError>;
}

pub trait ContactRepository: Send + Sync + 'static {
    fn list(&self, query: &ContactQuery) -> Result<Vec<Contact>, DomainError>;
    fn find(&self, contact_id: i32) -> Result<Option<Contact>, DomainError>;
    fn insert(&self, contact: NewContact) -> Result<Contact, DomainError>;
    fn resolve(
        &self,
        contact_id: i32,
        response: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Contact>, DomainError>;
    fn delete(&self, contact_id: i32) -> Result<bool, DomainError>;
}

pub trait DashboardRepository: Send + Sync + 'static {
    fn overview(&self) -> Result<Overview, DomainError>;
    fn status_figures(&self, status: OrderStatus) -> Result<StatusFigures, DomainError>;
    fn monthly_figures(&self, window: &MonthWindow) -> Result<MonthlyFigures, DomainError>;
}

// ── Side effects ─────────────────────────────────────────────────────────────

pub trait Mailer: Send + Sync + 'static {
    fn send(&self, email: &Email) -> Result<(), DomainError>;
}
