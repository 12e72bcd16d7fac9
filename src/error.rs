//! Typed error taxonomy for the Google Sheets integration.
//!
//! Every append attempt and catalog read resolves to either a success value
//! or exactly one of these variants; nothing is swallowed at the core
//! boundary. Validation failures are raised before any network call.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SheetsError {
    /// Order/config precondition not met. Raised before any remote call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Could not obtain (or use) a valid credential for the remote call.
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// The stable tab locator (GID) could not be mapped to a writable range.
    #[error("tab locator could not be resolved: {0}")]
    RangeResolution(String),

    /// The destination explicitly rejects the write because of cell/range
    /// protection. Surfaced verbatim so the operator can contact the sheet
    /// owner; never retried.
    #[error("sheet is protected: {0}")]
    SheetProtected(String),

    /// Network error or server-side 5xx/429. Safe for the caller to retry
    /// with backoff; no retry happens inside the core.
    #[error("transient write failure: {0}")]
    TransientWrite(String),

    /// The catalog read path failed. Callers substitute the built-in
    /// fallback catalog instead of blocking the workflow.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl SheetsError {
    /// Whether the caller may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SheetsError::TransientWrite(_))
    }

    /// Stable machine-readable tag, used in logs and surfaced outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            SheetsError::Validation(_) => "validation_failed",
            SheetsError::Unauthenticated(_) => "unauthenticated",
            SheetsError::RangeResolution(_) => "range_resolution_failed",
            SheetsError::SheetProtected(_) => "sheet_protected",
            SheetsError::TransientWrite(_) => "transient_write_failure",
            SheetsError::CatalogUnavailable(_) => "catalog_unavailable",
        }
    }
}
