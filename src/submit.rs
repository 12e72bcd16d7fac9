//! Order submission: two independent appends against the sales and payments
//! tabs, plus the write-once guard that keeps an order from being recorded
//! twice.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::SheetsError;
use crate::records;
use crate::sheets::SheetAppender;
use crate::types::{Order, SubmitOutcome};

/// Tracks submitted order ids for the lifetime of the process. Order ids are
/// timestamp-based, so this set only ever guards against the same in-memory
/// order being pushed twice (double-tap on the submit action).
#[derive(Debug, Default)]
pub struct OrderSubmitter {
    submitted: Mutex<HashSet<String>>,
}

impl OrderSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the order on both tabs.
    ///
    /// Preconditions (order contents, config completeness, first submission
    /// of this id) are checked before any network traffic; a failure there is
    /// `Err(Validation)` and nothing was written. Past that point the two
    /// appends run independently, sales first, and the per-append outcomes
    /// come back in `SubmitOutcome` — a payment failure after a sales success
    /// is reported as exactly that, not rolled back.
    ///
    /// The order id is marked submitted once at least one append lands, so a
    /// fully failed submission stays retryable while a partial one can no
    /// longer duplicate its sales rows.
    pub async fn submit<A: SheetAppender>(
        &self,
        appender: &A,
        order: &Order,
        config: &AppConfig,
    ) -> Result<SubmitOutcome, SheetsError> {
        validate_order(order)?;
        config.validate_for_submit()?;
        {
            let submitted = self
                .submitted
                .lock()
                .map_err(|_| SheetsError::Validation("submission guard poisoned".to_string()))?;
            if submitted.contains(&order.id) {
                return Err(SheetsError::Validation(format!(
                    "order {} was already submitted",
                    order.id
                )));
            }
        }

        let submitted_at = Utc::now();
        let sales_batch = records::sales_rows(order, config, submitted_at);
        let payment = records::payment_row(order, config, submitted_at);

        info!(
            order_id = %order.id,
            lines = sales_batch.len(),
            total = order.total,
            "submitting order"
        );

        let sales = appender
            .append_rows(&config.spreadsheet_id, &config.sales_sheet_gid, &sales_batch)
            .await;
        let payment = appender
            .append_rows(
                &config.spreadsheet_id,
                &config.payments_sheet_gid,
                std::slice::from_ref(&payment),
            )
            .await;

        match (&sales, &payment) {
            (Ok(s), Ok(p)) => info!(
                order_id = %order.id,
                sales_range = %s.updated_range,
                payment_range = %p.updated_range,
                "order recorded"
            ),
            (Ok(_), Err(e)) => warn!(
                order_id = %order.id,
                kind = e.kind(),
                error = %e,
                "sales recorded but payment append failed"
            ),
            (Err(e), Ok(_)) => warn!(
                order_id = %order.id,
                kind = e.kind(),
                error = %e,
                "payment recorded but sales append failed"
            ),
            (Err(se), Err(pe)) => warn!(
                order_id = %order.id,
                sales_kind = se.kind(),
                payment_kind = pe.kind(),
                "both appends failed"
            ),
        }

        if sales.is_ok() || payment.is_ok() {
            let mut submitted = self
                .submitted
                .lock()
                .map_err(|_| SheetsError::Validation("submission guard poisoned".to_string()))?;
            submitted.insert(order.id.clone());
        }

        Ok(SubmitOutcome { sales, payment })
    }
}

/// Same preconditions `OrderDraft::validate` enforces, re-checked here since
/// an `Order` can be constructed by a caller that bypassed the draft.
fn validate_order(order: &Order) -> Result<(), SheetsError> {
    if order.items.is_empty() {
        return Err(SheetsError::Validation(
            "order has no line items".to_string(),
        ));
    }
    if order.customer.name.trim().is_empty() || order.customer.phone.trim().is_empty() {
        return Err(SheetsError::Validation(
            "customer name and phone are required".to_string(),
        ));
    }
    if order.driver.trim().is_empty() {
        return Err(SheetsError::Validation(
            "driver selection is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::NaiveDate;

    use crate::types::{AppendResult, CartItem, Customer, PaymentMethod, Sku};

    fn order() -> Order {
        let sku = Sku {
            id: "sku-0".into(),
            name: "COKE 50CL PET".into(),
            unit_price: 4400,
            pack_type: "PET".into(),
            pack_type2: String::new(),
        };
        Order {
            id: "ORD-1".into(),
            customer: Customer {
                name: "Mama Nkechi Stores".into(),
                address: String::new(),
                phone: "08031234567".into(),
            },
            items: vec![CartItem {
                sku,
                quantity: 2,
                line_total: 8800,
            }],
            subtotal: 8800,
            total: 8800,
            payment_method: PaymentMethod::BankTransfer,
            amount_paid: 8800,
            balance: 0,
            transaction_date: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap(),
            driver: "DEPOT BULK".into(),
        }
    }

    /// Succeeds on listed gids, fails on the rest; counts every call.
    struct ScriptedAppender {
        ok_gids: Vec<String>,
        failure: fn() -> SheetsError,
        calls: AtomicU32,
    }

    impl ScriptedAppender {
        fn new(ok_gids: &[&str], failure: fn() -> SheetsError) -> Self {
            ScriptedAppender {
                ok_gids: ok_gids.iter().map(|g| g.to_string()).collect(),
                failure,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl SheetAppender for ScriptedAppender {
        async fn append_rows(
            &self,
            _spreadsheet_id: &str,
            gid: &str,
            rows: &[Vec<String>],
        ) -> Result<AppendResult, SheetsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok_gids.iter().any(|g| g == gid) {
                Ok(AppendResult {
                    updated_rows: rows.len() as u32,
                    updated_range: format!("'Tab {gid}'!A1:S{}", rows.len()),
                })
            } else {
                Err((self.failure)())
            }
        }
    }

    fn protected() -> SheetsError {
        SheetsError::SheetProtected("the destination range is protected".into())
    }

    #[tokio::test]
    async fn both_appends_succeed() {
        let config = AppConfig::default();
        let appender = ScriptedAppender::new(
            &[config.sales_sheet_gid.as_str(), config.payments_sheet_gid.as_str()],
            protected,
        );
        let outcome = OrderSubmitter::new()
            .submit(&appender, &order(), &config)
            .await
            .unwrap();
        assert!(outcome.fully_recorded());
        assert_eq!(outcome.sales.unwrap().updated_rows, 1);
        assert_eq!(appender.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn payment_failure_after_sales_success_reports_both() {
        let config = AppConfig::default();
        let appender = ScriptedAppender::new(&[config.sales_sheet_gid.as_str()], protected);
        let outcome = OrderSubmitter::new()
            .submit(&appender, &order(), &config)
            .await
            .unwrap();
        assert!(outcome.sales.is_ok());
        assert_eq!(outcome.payment.unwrap_err().kind(), "sheet_protected");
        // sales append was not retried or rolled back
        assert_eq!(appender.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sales_failure_still_attempts_payment() {
        let config = AppConfig::default();
        let appender = ScriptedAppender::new(&[config.payments_sheet_gid.as_str()], protected);
        let outcome = OrderSubmitter::new()
            .submit(&appender, &order(), &config)
            .await
            .unwrap();
        assert!(outcome.sales.is_err());
        assert!(outcome.payment.is_ok());
        assert_eq!(appender.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn partial_success_blocks_resubmission() {
        let config = AppConfig::default();
        let appender = ScriptedAppender::new(&[config.sales_sheet_gid.as_str()], protected);
        let submitter = OrderSubmitter::new();
        let the_order = order();

        submitter.submit(&appender, &the_order, &config).await.unwrap();
        let err = submitter
            .submit(&appender, &the_order, &config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
        // no third or fourth append call happened
        assert_eq!(appender.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn full_failure_stays_retryable() {
        let config = AppConfig::default();
        let failing = ScriptedAppender::new(&[], || {
            SheetsError::TransientWrite("HTTP 503 from append endpoint".into())
        });
        let submitter = OrderSubmitter::new();
        let the_order = order();

        let first = submitter.submit(&failing, &the_order, &config).await.unwrap();
        assert!(!first.fully_recorded());

        let working = ScriptedAppender::new(
            &[config.sales_sheet_gid.as_str(), config.payments_sheet_gid.as_str()],
            protected,
        );
        let second = submitter.submit(&working, &the_order, &config).await.unwrap();
        assert!(second.fully_recorded());
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_network() {
        let config = AppConfig::default();
        let appender = ScriptedAppender::new(&[], protected);
        let mut empty = order();
        empty.items.clear();

        let err = OrderSubmitter::new()
            .submit(&appender, &empty, &config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
        assert_eq!(appender.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incomplete_config_is_a_validation_failure() {
        let mut config = AppConfig::default();
        config.sales_sheet_gid = String::new();
        let appender = ScriptedAppender::new(&[], protected);

        let err = OrderSubmitter::new()
            .submit(&appender, &order(), &config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
        assert_eq!(appender.calls.load(Ordering::SeqCst), 0);
    }
}
