use bigdecimal::BigDecimal;

use super::order_flow::{PlacedOrder, StatusChange};
use super::order::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// `1234567.5` → `1,234,567.50 đ`
pub fn format_money(amount: &BigDecimal) -> String {
    let fixed = amount.with_scale(2).to_string();
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if frac.chars().all(|c| c == '0') {
        format!("{sign}{grouped} đ")
    } else {
        format!("{sign}{grouped}.{frac} đ")
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Processing => "Awaiting confirmation",
        OrderStatus::Confirmed => "Confirmed",
        OrderStatus::Shipping => "On its way",
        OrderStatus::Completed => "Delivered",
        OrderStatus::Cancelled => "Cancelled",
    }
}

pub fn order_confirmation(order: &PlacedOrder) -> Email {
    let rows: String = order
        .lines
        .iter()
        .map(|l| {
            format!(
                "<tr><td>{}</td><td style=\"text-align:center\">{}</td><td style=\"text-align:right\">{}</td></tr>",
                escape(&l.title),
                l.quantity,
                format_money(&l.unit_price)
            )
        })
        .collect();

    let discount_row = if order.price.discount > BigDecimal::from(0) {
        format!(
            "<p><strong>Voucher {}:</strong> -{}</p>",
            escape(order.voucher_code.as_deref().unwrap_or_default()),
            format_money(&order.price.discount)
        )
    } else {
        String::new()
    };

    let html_body = format!(
        "<html><body>\
         <h2>Order #{id} confirmed</h2>\
         <p>Hello {name}, your order has been placed.</p>\
         <table style=\"width:100%;border-collapse:collapse\">\
         <thead><tr><th>Book</th><th>Qty</th><th>Unit price</th></tr></thead>\
         <tbody>{rows}</tbody></table>\
         <p><strong>Subtotal:</strong> {subtotal}</p>\
         {discount_row}\
         <p><strong>Shipping fee:</strong> {shipping}</p>\
         <h3>Total: {total}</h3>\
         <p><strong>Shipping address:</strong> {address}</p>\
         <p>Thank you for shopping with us!</p>\
         </body></html>",
        id = order.order_id,
        name = escape(&order.customer.full_name),
        subtotal = format_money(&order.price.subtotal),
        shipping = format_money(&order.price.shipping_fee),
        total = format_money(&order.price.total),
        address = escape(&order.shipping_address),
    );

    Email {
        to: order.customer.email.clone(),
        subject: format!("Order #{} confirmed", order.order_id),
        html_body,
    }
}

/// `None` when the order's owner no longer exists.
pub fn status_update(change: &StatusChange) -> Option<Email> {
    let customer = change.customer.as_ref()?;
    let html_body = format!(
        "<html><body>\
         <h2>Order #{id} update</h2>\
         <p>Hello {name},</p>\
         <p>Your order moved from <strong>{from}</strong> to <strong>{to}</strong>.</p>\
         </body></html>",
        id = change.order_id,
        name = escape(&customer.full_name),
        from = status_label(change.from),
        to = status_label(change.to),
    );
    Some(Email {
        to: customer.email.clone(),
        subject: format!("Order #{}: {}", change.order_id, status_label(change.to)),
        html_body,
    })
}
