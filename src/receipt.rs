//! Plain-text receipts
//!
//! Fixed-width layout for 80mm thermal printers in text mode.

use crate::entity::order::OrderType;
use crate::entity::{dining_table, order, order_item, restaurant_settings};

/// Characters per printed line
pub const RECEIPT_WIDTH: usize = 40;

/// Format cents as "12.50" (negative amounts keep their sign)
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.chars().take(RECEIPT_WIDTH).collect();
    }
    let pad = (RECEIPT_WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left text and right-aligned value on one line, truncating the left side
fn two_col(left: &str, right: &str) -> String {
    let right_len = right.chars().count();
    let room = RECEIPT_WIDTH.saturating_sub(right_len + 1);
    let left: String = left.chars().take(room).collect();
    let gap = RECEIPT_WIDTH - left.chars().count() - right_len;
    format!("{}{}{}", left, " ".repeat(gap), right)
}

fn rule() -> String {
    "-".repeat(RECEIPT_WIDTH)
}

/// Service charge applied on the receipt; dine-in only
pub fn service_fee_cents(order: &order::Model, fee_percent: i32) -> i64 {
    if order.order_type != OrderType::DineIn.as_str() || fee_percent <= 0 {
        return 0;
    }
    order.total_cents * i64::from(fee_percent) / 100
}

pub fn render_receipt(
    settings: &restaurant_settings::Model,
    order: &order::Model,
    items: &[order_item::Model],
    table: Option<&dining_table::Model>,
) -> String {
    let mut lines = Vec::new();

    lines.push(center(&settings.name.to_uppercase()));
    if let Some(address) = settings.address.as_deref().filter(|a| !a.is_empty()) {
        lines.push(center(address));
    }
    if let Some(phone) = settings.phone.as_deref().filter(|p| !p.is_empty()) {
        lines.push(center(&format!("Tel: {}", phone)));
    }
    lines.push(rule());

    let when = chrono::DateTime::from_timestamp(order.created_at, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    lines.push(two_col(&format!("Order #{}", order.order_number), &when));

    let service = match (order.order_type.as_str(), table) {
        ("dine_in", Some(t)) => format!("Table {}", t.number),
        ("dine_in", None) => "Dine in".to_string(),
        ("delivery", _) => "Delivery".to_string(),
        _ => "Takeaway".to_string(),
    };
    lines.push(service);
    if let Some(name) = order.customer_name.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("Customer: {}", name));
    }
    lines.push(rule());

    for item in items {
        let label = format!("{}x {}", item.quantity, item.name);
        lines.push(two_col(&label, &format_cents(item.line_total_cents())));
        if let Some(notes) = item.notes.as_deref().filter(|n| !n.is_empty()) {
            lines.push(format!("   {}", notes));
        }
    }
    lines.push(rule());

    lines.push(two_col("Subtotal", &format_cents(order.subtotal_cents)));
    if order.discount_cents > 0 {
        let label = match &order.coupon_code {
            Some(code) => format!("Discount ({})", code),
            None => "Discount".to_string(),
        };
        lines.push(two_col(&label, &format_cents(-order.discount_cents)));
    }
    let fee = service_fee_cents(order, settings.service_fee_percent);
    if fee > 0 {
        lines.push(two_col(
            &format!("Service ({}%)", settings.service_fee_percent),
            &format_cents(fee),
        ));
    }
    lines.push(two_col(
        "TOTAL",
        &format!("{} {}", settings.currency, format_cents(order.total_cents + fee)),
    ));
    lines.push(rule());

    if let Some(footer) = settings.receipt_footer.as_deref().filter(|f| !f.is_empty()) {
        lines.push(center(footer));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
