use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub sold_quantity: i32,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

/// Partial book update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    pub price: Option<BigDecimal>,
    pub stock_quantity: Option<i32>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone)]
pub struct PaymentMethod {
    pub payment_method_id: String,
    pub method_name: String,
    pub description: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct Discount {
    pub discount_id: String,
    pub voucher_code: String,
    pub discount_percentage: BigDecimal,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub discount_id: String,
    pub voucher_code: String,
    pub discount_percentage: BigDecimal,
    pub expiry_date: DateTime<Utc>,
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    Ok(())
}

fn check_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price < BigDecimal::from(0) {
        return Err(DomainError::invalid("price must not be negative"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::invalid("stock quantity must not be negative"));
    }
    Ok(())
}

impl NewBook {
    pub fn validate(&self) -> Result<(), DomainError> {
        require("book_id", &self.book_id)?;
        if self.book_id.len() > 10 {
            return Err(DomainError::invalid("book_id is at most 10 characters"));
        }
        require("title", &self.title)?;
        require("author", &self.author)?;
        check_price(&self.price)?;
        check_stock(self.stock_quantity)
    }
}

impl BookChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(author) = &self.author {
            require("author", author)?;
        }
        if let Some(price) = &self.price {
            check_price(price)?;
        }
        if let Some(stock) = self.stock_quantity {
            check_stock(stock)?;
        }
        Ok(())
    }
}

impl Category {
    pub fn validate(&self) -> Result<(), DomainError> {
        require("category_id", &self.category_id)?;
        if self.category_id.len() > 10 {
            return Err(DomainError::invalid("category_id is at most 10 characters"));
        }
        require("category_name", &self.category_name)
    }
}

impl NewDiscount {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        require("discount_id", &self.discount_id)?;
        require("voucher_code", &self.voucher_code)?;
        if self.discount_percentage <= BigDecimal::from(0)
            || self.discount_percentage > BigDecimal::from(100)
        {
            return Err(DomainError::invalid(
                "discount percentage must be greater than 0 and at most 100",
            ));
        }
        if self.expiry_date <= now {
            return Err(DomainError::invalid("expiry date must be in the future"));
        }
        Ok(())
    }
}
