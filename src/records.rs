//! Spreadsheet row serialization: a completed order becomes one sales row
//! per cart line plus a single payment row.
//!
//! Column order on both tabs is fixed by the live spreadsheet and must not
//! change without coordinating with the sheet owners.

use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::types::Order;

/// Warehouse column value, constant for this deployment.
pub const WAREHOUSE_LABEL: &str = "Warehouse 1";

/// Operation column on the sales tab.
pub const OPERATION_LABEL: &str = "Load Out";

/// Bank column value for bank-transfer payments. Anything else records "POS".
pub const BANK_TRANSFER_LABEL: &str = "TRANSFER";

/// "Use now" column on the payments tab, constant for every row this app
/// writes. Forwarded payments are entered by hand, never by this app.
pub const USE_NOW_FLAG: &str = "YES";

/// Calendar-date format used on both tabs (en-GB day first).
const SHEET_DATE_FORMAT: &str = "%d/%m/%Y";

// ---------------------------------------------------------------------------
// Sales rows
// ---------------------------------------------------------------------------

/// One row per cart line, in the sales tab's fixed 19-column order.
///
/// Order-level figures (payment method, amount paid, balance) repeat on every
/// row so each line reads as a complete record when the sheet is filtered.
pub fn sales_rows(
    order: &Order,
    config: &AppConfig,
    submitted_at: DateTime<Utc>,
) -> Vec<Vec<String>> {
    let timestamp = submitted_at.to_rfc3339();
    let transaction_date = order.transaction_date.format(SHEET_DATE_FORMAT).to_string();

    order
        .items
        .iter()
        .map(|item| {
            vec![
                timestamp.clone(),
                transaction_date.clone(),
                WAREHOUSE_LABEL.to_string(),
                OPERATION_LABEL.to_string(),
                item.sku.name.clone(),
                item.quantity.to_string(),
                item.sku.unit_price.to_string(),
                item.line_total.to_string(),
                item.sku.pack_type.clone(),
                order.driver.clone(),
                config.loader1.clone(),
                config.loader2.clone(),
                config.submitted_by.clone(),
                order.customer.name.clone(),
                order.customer.address.clone(),
                order.customer.phone.clone(),
                order.payment_method.as_str().to_string(),
                order.amount_paid.to_string(),
                order.balance.to_string(),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Payment row
// ---------------------------------------------------------------------------

/// The single payment-tab row for an order, in its fixed 11-field order.
/// The forwarded-date field is always left empty; the transaction date is
/// repeated in the trailing "new date" column the sheet expects.
pub fn payment_row(order: &Order, config: &AppConfig, submitted_at: DateTime<Utc>) -> Vec<String> {
    let transaction_date = order.transaction_date.format(SHEET_DATE_FORMAT).to_string();

    vec![
        submitted_at.to_rfc3339(),
        transaction_date.clone(),
        order.payment_method.bank_label().to_string(),
        WAREHOUSE_LABEL.to_string(),
        order.driver.clone(),
        order.customer.name.clone(),
        order.amount_paid.to_string(),
        USE_NOW_FLAG.to_string(),
        String::new(),
        transaction_date,
        config.submitted_by.clone(),
    ]
}
