//! In-memory order builder: cart lines, customer record, payment selection,
//! and the checkout preconditions.

use chrono::{Local, NaiveDate, Utc};

use crate::config::AppConfig;
use crate::error::SheetsError;
use crate::types::{CartItem, Customer, Order, PaymentMethod, Sku};

/// Mutable order under construction. `build` snapshots it into a write-once
/// `Order`; the draft itself can then be reset for the next customer.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub items: Vec<CartItem>,
    pub customer: Customer,
    pub payment_method: Option<PaymentMethod>,
    /// Amount the operator entered. Zero means "left blank" and triggers the
    /// substitution rule at build time.
    pub amount_paid: i64,
    pub driver: String,
    /// User-selected transaction date, defaulting to today.
    pub transaction_date: NaiveDate,
}

impl OrderDraft {
    pub fn new(config: &AppConfig) -> Self {
        OrderDraft {
            items: Vec::new(),
            customer: Customer::default(),
            payment_method: None,
            amount_paid: 0,
            driver: config.drivers.first().cloned().unwrap_or_default(),
            transaction_date: Local::now().date_naive(),
        }
    }

    /// Add a quantity of a SKU. An existing line for the same SKU is merged
    /// rather than duplicated; the line total follows the new quantity.
    pub fn add_item(&mut self, sku: Sku, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(existing) = self.items.iter_mut().find(|item| item.sku.id == sku.id) {
            let merged = existing.quantity + quantity;
            existing.set_quantity(merged);
        } else {
            self.items.push(CartItem::new(sku, quantity));
        }
    }

    /// Change a line's quantity. Zero (or an out-of-range index) removes it.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) {
        if index >= self.items.len() {
            return;
        }
        if quantity == 0 {
            self.items.remove(index);
        } else {
            self.items[index].set_quantity(quantity);
        }
    }

    pub fn remove_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn order_total(&self) -> i64 {
        self.items.iter().map(|item| item.line_total).sum()
    }

    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checkout preconditions, checked before anything touches the network.
    pub fn validate(&self) -> Result<(), SheetsError> {
        if self.items.is_empty() {
            return Err(SheetsError::Validation("cart is empty".to_string()));
        }
        if self.customer.name.trim().is_empty() {
            return Err(SheetsError::Validation(
                "customer name is required".to_string(),
            ));
        }
        if self.customer.phone.trim().is_empty() {
            return Err(SheetsError::Validation(
                "customer phone is required".to_string(),
            ));
        }
        if self.payment_method.is_none() {
            return Err(SheetsError::Validation(
                "payment method is required".to_string(),
            ));
        }
        if self.driver.trim().is_empty() {
            return Err(SheetsError::Validation(
                "driver selection is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Snapshot the draft into a completed order.
    ///
    /// The amount-paid substitution rule is applied here, once: a blank
    /// (zero) entry becomes the order total, and that single value is what
    /// the spreadsheet records, the receipt, and the share message all show.
    /// Balance is computed from the effective amount, floored at zero.
    pub fn build(&self) -> Result<Order, SheetsError> {
        self.validate()?;
        let total = self.order_total();
        let amount_paid = if self.amount_paid <= 0 {
            total
        } else {
            self.amount_paid
        };
        let balance = (total - amount_paid).max(0);

        Ok(Order {
            id: format!("ORD-{}", Utc::now().timestamp_millis()),
            customer: self.customer.clone(),
            items: self.items.clone(),
            subtotal: total,
            total,
            payment_method: self
                .payment_method
                .ok_or_else(|| SheetsError::Validation("payment method is required".to_string()))?,
            amount_paid,
            balance,
            transaction_date: self.transaction_date,
            driver: self.driver.clone(),
        })
    }

    /// Reset for the next customer, keeping the config-derived defaults.
    pub fn reset(&mut self, config: &AppConfig) {
        *self = OrderDraft::new(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(id: &str, name: &str, price: i64) -> Sku {
        Sku {
            id: id.to_string(),
            name: name.to_string(),
            unit_price: price,
            pack_type: "PET".to_string(),
            pack_type2: String::new(),
        }
    }

    fn filled_draft() -> OrderDraft {
        let config = AppConfig::default();
        let mut draft = OrderDraft::new(&config);
        draft.add_item(sku("sku-0", "COKE 50CL PET", 4400), 3);
        draft.add_item(sku("sku-12", "SCHWEPPES CHAPMAN 33CL CAN", 5800), 1);
        draft.customer = Customer {
            name: "Mama Nkechi Stores".to_string(),
            address: "12 Depot Road".to_string(),
            phone: "08031234567".to_string(),
        };
        draft.payment_method = Some(PaymentMethod::Pos);
        draft
    }

    #[test]
    fn adding_same_sku_merges_lines() {
        let config = AppConfig::default();
        let mut draft = OrderDraft::new(&config);
        draft.add_item(sku("sku-0", "COKE 50CL PET", 4400), 2);
        draft.add_item(sku("sku-0", "COKE 50CL PET", 4400), 3);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].quantity, 5);
        assert_eq!(draft.items[0].line_total, 22_000);
    }

    #[test]
    fn quantity_update_recomputes_line_total_and_zero_removes() {
        let config = AppConfig::default();
        let mut draft = OrderDraft::new(&config);
        draft.add_item(sku("sku-0", "COKE 50CL PET", 4400), 2);
        draft.update_quantity(0, 4);
        assert_eq!(draft.items[0].line_total, 17_600);
        draft.update_quantity(0, 0);
        assert!(draft.items.is_empty());
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let draft = filled_draft();
        assert_eq!(draft.order_total(), 3 * 4400 + 5800);
    }

    #[test]
    fn validation_reports_first_missing_precondition() {
        let config = AppConfig::default();
        let mut draft = OrderDraft::new(&config);
        assert_eq!(
            draft.validate().unwrap_err(),
            SheetsError::Validation("cart is empty".to_string())
        );

        draft.add_item(sku("sku-0", "COKE 50CL PET", 4400), 1);
        assert!(matches!(
            draft.validate().unwrap_err(),
            SheetsError::Validation(msg) if msg.contains("customer name")
        ));
    }

    #[test]
    fn blank_amount_paid_substitutes_order_total_everywhere() {
        // Order with 2 items (qty 3 @ 4400, qty 1 @ 5800), POS, paid 0.
        let order = filled_draft().build().unwrap();
        assert_eq!(order.total, 19_000);
        assert_eq!(order.amount_paid, 19_000);
        assert_eq!(order.balance, 0);
        assert_eq!(order.payment_method.bank_label(), "POS");
    }

    #[test]
    fn partial_payment_leaves_balance() {
        let mut draft = filled_draft();
        draft.amount_paid = 5_000;
        let order = draft.build().unwrap();
        assert_eq!(order.amount_paid, 5_000);
        assert_eq!(order.balance, 14_000);
    }

    #[test]
    fn overpayment_floors_balance_at_zero() {
        let mut draft = filled_draft();
        draft.amount_paid = 25_000;
        let order = draft.build().unwrap();
        assert_eq!(order.balance, 0);
    }

    #[test]
    fn order_id_is_time_based() {
        let order = filled_draft().build().unwrap();
        assert!(order.id.starts_with("ORD-"));
        assert!(order.id[4..].chars().all(|c| c.is_ascii_digit()));
    }
}
