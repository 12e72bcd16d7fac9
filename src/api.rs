//! Client-facing surface: the operations a settings or checkout screen calls.
//!
//! Thin by design — each function wires together the domain modules with the
//! injected client and reports in UI-friendly shapes.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::sheets::{TabReader, CONNECTIVITY_TIMEOUT};
use crate::types::ConnectivityReport;

pub use crate::catalog::{fetch_catalog, load_catalog};
pub use crate::submit::OrderSubmitter;

/// Rows of the price tab shown as a preview in the settings screen.
const SAMPLE_ROWS: usize = 3;

/// Verify the stored credential and spreadsheet target by reading the price
/// tab. Exercises the full path a real operation takes: token exchange, GID
/// addressing, CSV read.
pub async fn test_connectivity<R: TabReader>(
    reader: &R,
    config: &AppConfig,
) -> ConnectivityReport {
    let start = Instant::now();

    let read = tokio::time::timeout(
        CONNECTIVITY_TIMEOUT,
        reader.read_tab(&config.spreadsheet_id, &config.price_sheet_gid),
    )
    .await;

    let latency_ms = start.elapsed().as_millis() as u64;
    match read {
        Ok(Ok(rows)) => {
            let populated: Vec<Vec<String>> = rows
                .into_iter()
                .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
                .collect();
            info!(
                latency_ms,
                rows = populated.len(),
                "connectivity test passed"
            );
            ConnectivityReport {
                success: true,
                latency_ms,
                row_count: populated.len(),
                sample: populated.into_iter().take(SAMPLE_ROWS).collect(),
                error: None,
            }
        }
        Ok(Err(e)) => {
            warn!(latency_ms, kind = e.kind(), error = %e, "connectivity test failed");
            ConnectivityReport {
                success: false,
                latency_ms,
                row_count: 0,
                sample: Vec::new(),
                error: Some(e.to_string()),
            }
        }
        Err(_) => ConnectivityReport {
            success: false,
            latency_ms,
            row_count: 0,
            sample: Vec::new(),
            error: Some(format!(
                "spreadsheet did not respond within {} seconds",
                CONNECTIVITY_TIMEOUT.as_secs()
            )),
        },
    }
}
