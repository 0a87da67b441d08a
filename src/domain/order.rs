use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Flat fee added to every order after any voucher discount.
pub const SHIPPING_FEE: i64 = 30_000;

pub fn shipping_fee() -> BigDecimal {
    BigDecimal::from(SHIPPING_FEE)
}

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Processing,
    Confirmed,
    Shipping,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Processing,
        OrderStatus::Confirmed,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Primary key of the matching `order_status` row.
    pub fn code(self) -> &'static str {
        match self {
            OrderStatus::Processing => "PRC",
            OrderStatus::Confirmed => "CNF",
            OrderStatus::Shipping => "SHP",
            OrderStatus::Completed => "CMP",
            OrderStatus::Cancelled => "CCL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn next_states(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Processing => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Shipping],
            OrderStatus::Shipping => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::invalid(format!("unknown order status '{s}'")))
    }
}

// ── Pricing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Voucher {
    pub discount_id: String,
    pub code: String,
    pub percentage: BigDecimal,
    pub expires_at: DateTime<Utc>,
}

impl Voucher {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at >= now
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
}

/// Prices `(unit_price, quantity)` lines. The voucher percentage applies to
/// the subtotal only, never to the shipping fee.
pub fn price_lines<'a, I>(lines: I, voucher: Option<&Voucher>) -> PriceBreakdown
where
    I: IntoIterator<Item = (&'a BigDecimal, i32)>,
{
    let subtotal: BigDecimal = lines
        .into_iter()
        .map(|(price, qty)| price * BigDecimal::from(qty))
        .sum();
    let discount = match voucher {
        Some(v) => (&subtotal * &v.percentage / BigDecimal::from(100)).round(2),
        None => BigDecimal::from(0),
    };
    let shipping_fee = shipping_fee();
    let total = (&subtotal - &discount + &shipping_fee).round(2);
    PriceBreakdown {
        subtotal,
        discount,
        shipping_fee,
        total,
    }
}

// ── Identifiers ──────────────────────────────────────────────────────────────

const ORDER_ID_PREFIX: &str = "ORD";

/// Next order id after the most recently created one: `ORD00001`, `ORD00002`…
/// Falls back to eight random digits when the last id does not parse.
pub fn next_order_id(last: Option<&str>) -> String {
    let Some(last) = last else {
        return format!("{ORDER_ID_PREFIX}00001");
    };
    match last
        .strip_prefix(ORDER_ID_PREFIX)
        .and_then(|n| n.parse::<u64>().ok())
    {
        Some(n) => format!("{ORDER_ID_PREFIX}{:05}", n + 1),
        None => format!(
            "{ORDER_ID_PREFIX}{:08}",
            Uuid::new_v4().as_u128() % 100_000_000
        ),
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub book_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: Uuid,
    pub shipping_address: String,
    pub payment_method_id: String,
    pub voucher_code: Option<String>,
    pub lines: Vec<OrderLineInput>,
}

/// Who is asking for a status change; only the owner may confirm delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusActor {
    Admin,
    Owner(Uuid),
}

// ── Views ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub detail_id: i32,
    pub book_id: String,
    pub title: Option<String>,
    pub cover_image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub order_id: String,
    pub user_id: Uuid,
    pub customer_name: Option<String>,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method_id: Option<String>,
    pub payment_method_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub skip: i64,
    pub limit: i64,
}
