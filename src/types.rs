//! Domain records shared across the catalog, order builder, submitter, and
//! receipt renderer.
//!
//! Prices are plain integer naira (no minor unit in this business), so all
//! money fields are `i64` and arithmetic stays exact.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

/// A priced stock-keeping unit from the price tab. Immutable once loaded;
/// the catalog is refreshed wholesale on reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sku {
    pub id: String,
    pub name: String,
    pub unit_price: i64,
    #[serde(default)]
    pub pack_type: String,
    #[serde(default)]
    pub pack_type2: String,
}

/// One cart line. `line_total == quantity * sku.unit_price` holds after
/// every mutation; the only constructors/mutators live on `OrderDraft`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub sku: Sku,
    pub quantity: u32,
    pub line_total: i64,
}

impl CartItem {
    pub(crate) fn new(sku: Sku, quantity: u32) -> Self {
        let line_total = sku.unit_price * i64::from(quantity);
        CartItem {
            sku,
            quantity,
            line_total,
        }
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.line_total = self.sku.unit_price * i64::from(quantity);
    }
}

/// Free-form customer record; no identity beyond the current order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub phone: String,
}

/// Closed set of accepted payment methods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "POS")]
    Pos,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Pos => "POS",
        }
    }

    /// Fixed mapping used by the payment record's bank column.
    pub fn bank_label(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => crate::records::BANK_TRANSFER_LABEL,
            PaymentMethod::Pos => "POS",
        }
    }
}

/// A completed order. Write-once: built in memory by `OrderDraft::build`,
/// submitted exactly once, then only read for receipt rendering.
///
/// `amount_paid` already carries the substitution rule: a blank/zero entry
/// at checkout becomes the order total, and that one value is what both the
/// spreadsheet records and the receipt show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub customer: Customer,
    pub items: Vec<CartItem>,
    pub subtotal: i64,
    pub total: i64,
    pub payment_method: PaymentMethod,
    pub amount_paid: i64,
    pub balance: i64,
    /// User-selected transaction date, distinct from wall-clock submission
    /// time (which is stamped at serialization).
    pub transaction_date: NaiveDate,
    pub driver: String,
}

/// Result of one successful append call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppendResult {
    pub updated_rows: u32,
    pub updated_range: String,
}

/// Outcome of the settings-screen connectivity test.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectivityReport {
    pub success: bool,
    pub latency_ms: u64,
    pub row_count: usize,
    #[serde(default)]
    pub sample: Vec<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The two independent append outcomes of a submission. The writes are not
/// transactional: sales may succeed while payment fails (or vice versa), and
/// that partial state is reported as-is.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub sales: Result<AppendResult, SheetsError>,
    pub payment: Result<AppendResult, SheetsError>,
}

impl SubmitOutcome {
    /// True when both the sales rows and the payment row were appended.
    pub fn fully_recorded(&self) -> bool {
        self.sales.is_ok() && self.payment.is_ok()
    }
}
