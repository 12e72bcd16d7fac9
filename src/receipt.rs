//! Customer-facing receipt text: the plain-text slip handed to the image
//! renderer and the WhatsApp share message.

use crate::config::AppConfig;
use crate::types::Order;

/// Character width of the plain-text slip.
const RECEIPT_WIDTH: usize = 42;

/// Width of the separator rule in the share message.
const MESSAGE_RULE_WIDTH: usize = 35;

/// Whole-naira currency formatting with thousands separators, no minor unit.
pub fn format_naira(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-₦{grouped}")
    } else {
        format!("₦{grouped}")
    }
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((RECEIPT_WIDTH - len) / 2), text)
}

fn split_line(left: &str, right: &str) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = RECEIPT_WIDTH.saturating_sub(used).max(1);
    format!("{left}{}{right}", " ".repeat(gap))
}

fn rule() -> String {
    "─".repeat(RECEIPT_WIDTH)
}

// ---------------------------------------------------------------------------
// Plain-text slip
// ---------------------------------------------------------------------------

/// The receipt as printable lines. This is what the PNG renderer rasterizes.
pub fn receipt_lines(order: &Order, config: &AppConfig) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(center(&config.company_name));
    lines.push(center(&config.company_address));
    lines.push(center(&config.company_phone));
    lines.push(rule());
    lines.push(center("SALES RECEIPT"));
    lines.push(format!("Order: {}", order.id));
    lines.push(format!(
        "Date: {}",
        order.transaction_date.format("%d/%m/%Y")
    ));
    lines.push(format!("Driver: {}", order.driver));
    lines.push(rule());

    lines.push("Customer:".to_string());
    lines.push(format!("  {}", order.customer.name));
    if !order.customer.address.is_empty() {
        lines.push(format!("  {}", order.customer.address));
    }
    lines.push(format!("  {}", order.customer.phone));
    lines.push(rule());

    for item in &order.items {
        lines.push(item.sku.name.clone());
        lines.push(split_line(
            &format!(
                "  {} x {}",
                item.quantity,
                format_naira(item.sku.unit_price)
            ),
            &format_naira(item.line_total),
        ));
    }
    lines.push(rule());

    lines.push(split_line("TOTAL", &format_naira(order.total)));
    lines.push(split_line("Payment", order.payment_method.as_str()));
    lines.push(split_line("Paid", &format_naira(order.amount_paid)));
    if order.balance > 0 {
        lines.push(split_line("Balance", &format_naira(order.balance)));
    } else {
        lines.push(center("PAID IN FULL"));
    }
    lines.push(rule());
    lines.push(center("Thank you for your business!"));

    lines
}

pub fn receipt_text(order: &Order, config: &AppConfig) -> String {
    receipt_lines(order, config).join("\n")
}

// ---------------------------------------------------------------------------
// WhatsApp share
// ---------------------------------------------------------------------------

/// The share message, formatted for WhatsApp's bold markers and emoji.
pub fn whatsapp_message(order: &Order, config: &AppConfig) -> String {
    let separator = "─".repeat(MESSAGE_RULE_WIDTH);
    let mut message = String::new();

    message.push_str("📋 *SALES RECEIPT*\n");
    message.push_str(&format!("Order: {}\n", order.id));
    message.push_str(&format!(
        "Date: {}\n",
        order.transaction_date.format("%d/%m/%Y")
    ));
    message.push_str(&format!("Driver: {}\n\n", order.driver));

    message.push_str("👤 *Customer:*\n");
    message.push_str(&format!("{}\n", order.customer.name));
    if !order.customer.address.is_empty() {
        message.push_str(&format!("{}\n", order.customer.address));
    }
    message.push_str(&format!("{}\n\n", order.customer.phone));

    message.push_str("🛒 *Items:*\n");
    message.push_str(&format!("{separator}\n"));
    message.push_str("S/N | SKU | Qty | Price | Total\n");
    message.push_str(&format!("{separator}\n"));

    for (index, item) in order.items.iter().enumerate() {
        let short_name: String = item.sku.name.chars().take(12).collect();
        message.push_str(&format!(
            "{:>2} | {} | {:>2} | {} | {}\n",
            index + 1,
            short_name,
            item.quantity,
            format_naira(item.sku.unit_price),
            format_naira(item.line_total),
        ));
    }

    message.push_str(&format!("{separator}\n"));
    message.push_str(&format!("💰 *TOTAL: {}*\n", format_naira(order.total)));
    message.push_str(&format!("💳 Payment: {}\n", order.payment_method.as_str()));
    message.push_str(&format!("💵 Paid: {}\n", format_naira(order.amount_paid)));

    if order.balance > 0 {
        message.push_str(&format!("🔴 Balance: {}\n", format_naira(order.balance)));
    } else {
        message.push_str("✅ *PAID IN FULL*\n");
    }

    message.push_str(&format!("\n🏢 {}\n", config.company_name));
    message.push_str(&format!("📍 {}\n", config.company_address));
    message.push_str(&format!("📞 {}\n\n", config.company_phone));
    message.push_str("Thank you for your business! 🙏");

    message
}

/// The `wa.me` link carrying the share message as its text parameter.
pub fn whatsapp_share_url(order: &Order, config: &AppConfig) -> String {
    format!(
        "https://wa.me/?text={}",
        crate::sheets::percent_encode(&whatsapp_message(order, config))
    )
}
