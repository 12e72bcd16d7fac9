//! Depot POS backend.
//!
//! Point-of-sale core for a beverage depot that records every order in a
//! shared Google spreadsheet: catalog reads from the price tab, two
//! append-only writes per order (sales rows + payment row), service-account
//! authentication, and receipt rendering for WhatsApp sharing.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod order;
pub mod receipt;
pub mod receipt_image;
pub mod records;
pub mod sheets;
pub mod storage;
pub mod submit;
pub mod types;

pub use crate::auth::ServiceAccountKey;
pub use crate::config::AppConfig;
pub use crate::error::SheetsError;
pub use crate::order::OrderDraft;
pub use crate::sheets::{SheetAppender, SheetsClient, TabReader};
pub use crate::submit::OrderSubmitter;
pub use crate::types::{
    AppendResult, CartItem, ConnectivityReport, Customer, Order, PaymentMethod, Sku, SubmitOutcome,
};

/// Initialize structured logging (console + daily-rolling file in `log_dir`).
///
/// Call once at process start. The appender guard is intentionally leaked so
/// the file writer lives until process exit.
pub fn init_logging(log_dir: &Path) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depot_pos=debug"));

    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "depot-pos");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    std::mem::forget(guard);

    info!("Starting Depot POS v{}", env!("CARGO_PKG_VERSION"));
}
