//! Spreadsheet transport: GID-addressed reads and append-only writes.
//!
//! The client is constructed explicitly and passed to whichever component
//! needs it — there is no shared singleton, and configuration arrives per
//! call. Tabs are always addressed through their stable per-tab locator
//! (GID): reads go through the GID export endpoint directly, and writes
//! resolve the tab's current display title from its GID immediately before
//! the range is built. The quoted range string is constructed in exactly one
//! place (`quote_range_prefix`) so the quoting rules for titles with spaces,
//! parentheses, or hyphens cannot drift.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{self, AccessToken, ServiceAccountKey};
use crate::error::SheetsError;
use crate::types::AppendResult;

/// Default timeout for API requests (30 seconds).
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout used specifically for the lightweight connectivity test.
pub(crate) const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

const API_BASE: &str = "https://sheets.googleapis.com/v4";
const EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Read side of the transport, as consumed by the catalog source.
#[allow(async_fn_in_trait)]
pub trait TabReader {
    /// Return the tab's contents as rows of text. Row 0 is the header row;
    /// blank trailing rows are filtered by the caller.
    async fn read_tab(
        &self,
        spreadsheet_id: &str,
        gid: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError>;
}

/// Write side of the transport, as consumed by the order submitter.
#[allow(async_fn_in_trait)]
pub trait SheetAppender {
    /// Append `rows` after the last populated row of the tab addressed by
    /// `gid`. Append-only: existing rows are never overwritten.
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        gid: &str,
        rows: &[Vec<String>],
    ) -> Result<AppendResult, SheetsError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated spreadsheet client holding the service-account key and an
/// HTTP client with a fixed request timeout.
pub struct SheetsClient {
    http: reqwest::Client,
    key: ServiceAccountKey,
    api_base: String,
    export_base: String,
    token_url: String,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SheetsError::TransientWrite(format!("failed to create HTTP client: {e}")))?;
        Ok(SheetsClient {
            http,
            key,
            api_base: API_BASE.to_string(),
            export_base: EXPORT_BASE.to_string(),
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Point the client at alternative endpoints (self-hosted proxy, tests).
    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        export_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.export_base = export_base.into();
        self.token_url = token_url.into();
        self
    }

    /// Mint a fresh bearer token. Called once per logical operation; an
    /// append reuses one token for its resolve + write pair.
    pub(crate) async fn token(&self) -> Result<AccessToken, SheetsError> {
        auth::fetch_access_token(&self.http, &self.token_url, &self.key).await
    }

    /// Resolve the current display title of the tab addressed by `gid`.
    pub async fn resolve_tab_title(
        &self,
        spreadsheet_id: &str,
        gid: &str,
    ) -> Result<String, SheetsError> {
        let token = self.token().await?;
        self.resolve_with_token(&token, spreadsheet_id, gid).await
    }

    async fn resolve_with_token(
        &self,
        token: &AccessToken,
        spreadsheet_id: &str,
        gid: &str,
    ) -> Result<String, SheetsError> {
        let wanted: i64 = gid.trim().parse().map_err(|_| {
            SheetsError::RangeResolution(format!("tab locator is not a numeric GID: {gid:?}"))
        })?;

        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties(sheetId,title)",
            self.api_base, spreadsheet_id
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token.secret)
            .send()
            .await
            .map_err(|e| SheetsError::TransientWrite(friendly_error(&self.api_base, &e)))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if status == 401 {
            return Err(SheetsError::Unauthenticated(detail_message(status, &body)));
        }
        if !(200..300).contains(&status) {
            return Err(SheetsError::RangeResolution(format!(
                "spreadsheet metadata fetch failed: {}",
                detail_message(status, &body)
            )));
        }

        let meta: SpreadsheetMeta = serde_json::from_str(&body).map_err(|e| {
            SheetsError::RangeResolution(format!("malformed spreadsheet metadata: {e}"))
        })?;
        match find_tab_title(&meta, wanted) {
            Some(title) => {
                debug!(gid = wanted, title, "resolved tab locator");
                Ok(title.to_string())
            }
            None => Err(SheetsError::RangeResolution(format!(
                "no tab with GID {wanted} in spreadsheet"
            ))),
        }
    }

    async fn read_tab_inner(
        &self,
        spreadsheet_id: &str,
        gid: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        // Token problems stay distinct from read failures.
        let token = self.token().await?;

        let url = format!(
            "{}/{}/export?format=csv&gid={}",
            self.export_base,
            spreadsheet_id,
            gid.trim()
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token.secret)
            .send()
            .await
            .map_err(|e| SheetsError::CatalogUnavailable(friendly_error(&self.export_base, &e)))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::CatalogUnavailable(detail_message(status, &body)));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| SheetsError::CatalogUnavailable(format!("body read failed: {e}")))?;
        Ok(parse_csv(&text))
    }

    async fn append_rows_inner(
        &self,
        spreadsheet_id: &str,
        gid: &str,
        rows: &[Vec<String>],
    ) -> Result<AppendResult, SheetsError> {
        if rows.is_empty() {
            return Err(SheetsError::Validation("no rows to append".to_string()));
        }

        let token = self.token().await?;
        let title = self.resolve_with_token(&token, spreadsheet_id, gid).await?;
        let range = quote_range_prefix(&title);

        let url = format!(
            "{}/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.api_base,
            spreadsheet_id,
            percent_encode(&range)
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&token.secret)
            .json(&AppendRequest { values: rows })
            .send()
            .await
            .map_err(|e| SheetsError::TransientWrite(friendly_error(&self.api_base, &e)))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            let err = classify_write_failure(status, &body);
            warn!(status, kind = err.kind(), "append rejected");
            return Err(err);
        }

        let parsed: AppendResponse = serde_json::from_str(&body).map_err(|e| {
            SheetsError::TransientWrite(format!("malformed append response: {e}"))
        })?;
        match parsed.updates {
            Some(updates) => Ok(AppendResult {
                updated_rows: updates.updated_rows,
                updated_range: updates.updated_range,
            }),
            None => Err(SheetsError::TransientWrite(
                "append response missing update summary".to_string(),
            )),
        }
    }
}

impl TabReader for SheetsClient {
    async fn read_tab(
        &self,
        spreadsheet_id: &str,
        gid: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        self.read_tab_inner(spreadsheet_id, gid).await
    }
}

impl SheetAppender for SheetsClient {
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        gid: &str,
        rows: &[Vec<String>],
    ) -> Result<AppendResult, SheetsError> {
        self.append_rows_inner(spreadsheet_id, gid, rows).await
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AppendRequest<'a> {
    values: &'a [Vec<String>],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AppendUpdates {
    updated_rows: u32,
    updated_range: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SpreadsheetMeta {
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiErrorDetail {
    message: String,
    status: String,
}

// ---------------------------------------------------------------------------
// Resolution and quoting
// ---------------------------------------------------------------------------

fn find_tab_title(meta: &SpreadsheetMeta, gid: i64) -> Option<&str> {
    meta.sheets
        .iter()
        .find(|s| s.properties.sheet_id == gid)
        .map(|s| s.properties.title.as_str())
}

/// Build the range prefix for a resolved tab title. The title is always
/// single-quoted and embedded quotes are doubled, so names with spaces,
/// parentheses, or hyphens address the same tab the GID resolved to.
pub fn quote_range_prefix(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("cannot reach {url}");
    }
    if err.is_timeout() {
        return format!("connection to {url} timed out");
    }
    format!("network error communicating with {url}: {err}")
}

/// Pull the API's error message out of a failure body, falling back to the
/// raw body or the bare status code.
fn detail_message(status: u16, body: &str) -> String {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    if let Some(detail) = parsed.error {
        if !detail.message.trim().is_empty() {
            return format!("{} (HTTP {status})", detail.message.trim());
        }
        if !detail.status.trim().is_empty() {
            return format!("{} (HTTP {status})", detail.status.trim());
        }
    }
    if !body.trim().is_empty() {
        return format!("HTTP {status}: {}", body.trim());
    }
    format!("HTTP {status}")
}

fn is_protection_rejection(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("protected cell")
        || lower.contains("protected range")
        || lower.contains("protected sheet")
        || lower.contains("is protecting")
        || lower.contains("cannot edit")
}

fn is_range_rejection(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("unable to parse range") || lower.contains("invalid range")
}

/// Map a failed append to exactly one taxonomy value.
fn classify_write_failure(status: u16, body: &str) -> SheetsError {
    let detail = detail_message(status, body);
    match status {
        401 => SheetsError::Unauthenticated(detail),
        403 if is_protection_rejection(body) => SheetsError::SheetProtected(detail),
        403 => SheetsError::Unauthenticated(format!(
            "service account has no edit access: {detail}"
        )),
        400 if is_range_rejection(body) => SheetsError::RangeResolution(detail),
        429 => SheetsError::TransientWrite(detail),
        s if s >= 500 => SheetsError::TransientWrite(detail),
        // Unknown failures are treated as transient by default.
        _ => SheetsError::TransientWrite(detail),
    }
}

// ---------------------------------------------------------------------------
// CSV and URL encoding
// ---------------------------------------------------------------------------

/// Quote-aware CSV parser for the GID export format. Empty cells normalise
/// to empty strings; newlines inside quoted cells are preserved.
pub(crate) fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        cell.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => cell.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.push(ch),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    rows
}

pub(crate) fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for b in input.bytes() {
        let is_unreserved =
            b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b'~';
        if is_unreserved {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_titles_with_awkward_characters() {
        assert_eq!(quote_range_prefix("Sales"), "'Sales'");
        assert_eq!(
            quote_range_prefix("Sales (Load Out) - 2024"),
            "'Sales (Load Out) - 2024'"
        );
        assert_eq!(quote_range_prefix("Driver's Log"), "'Driver''s Log'");
    }

    #[test]
    fn resolves_gid_to_title_from_metadata() {
        let meta: SpreadsheetMeta = serde_json::from_str(
            r#"{"sheets":[
                {"properties":{"sheetId":311399969,"title":"Sales (Load Out) - 2024"}},
                {"properties":{"sheetId":1324216461,"title":"Price List"}},
                {"properties":{"sheetId":495567720,"title":"Payments"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            find_tab_title(&meta, 311399969),
            Some("Sales (Load Out) - 2024")
        );
        assert_eq!(find_tab_title(&meta, 1324216461), Some("Price List"));
        assert_eq!(find_tab_title(&meta, 42), None);
    }

    #[test]
    fn classifies_auth_protection_range_and_transient() {
        let protected = classify_write_failure(
            403,
            r#"{"error":{"code":403,"message":"You are trying to edit a protected cell or object.","status":"PERMISSION_DENIED"}}"#,
        );
        assert!(matches!(protected, SheetsError::SheetProtected(_)));

        let forbidden = classify_write_failure(
            403,
            r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#,
        );
        assert!(matches!(forbidden, SheetsError::Unauthenticated(_)));

        assert!(matches!(
            classify_write_failure(401, "{}"),
            SheetsError::Unauthenticated(_)
        ));
        assert!(matches!(
            classify_write_failure(
                400,
                r#"{"error":{"message":"Unable to parse range: 'Nope'!A1"}}"#
            ),
            SheetsError::RangeResolution(_)
        ));
        assert!(classify_write_failure(429, "{}").is_retryable());
        assert!(classify_write_failure(503, "{}").is_retryable());
        assert!(classify_write_failure(418, "{}").is_retryable());
    }

    #[test]
    fn detail_message_prefers_api_error_text() {
        let msg = detail_message(
            403,
            r#"{"error":{"message":"You are trying to edit a protected cell or object.","status":"PERMISSION_DENIED"}}"#,
        );
        assert_eq!(
            msg,
            "You are trying to edit a protected cell or object. (HTTP 403)"
        );
        assert_eq!(detail_message(502, ""), "HTTP 502");
        assert_eq!(detail_message(500, "upstream blew up"), "HTTP 500: upstream blew up");
    }

    #[test]
    fn parses_plain_and_quoted_csv() {
        let rows = parse_csv("SKU,PRICE,PACK\nCOKE 50CL PET,4400,PET\n\"FANTA, ORANGE\",5800,\"12 x 50cl\"\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["COKE 50CL PET", "4400", "PET"]);
        assert_eq!(rows[2], vec!["FANTA, ORANGE", "5800", "12 x 50cl"]);
    }

    #[test]
    fn preserves_blank_cells_and_rows_for_the_caller() {
        let rows = parse_csv("a,,c\n,,\r\nx,y,z");
        assert_eq!(rows[0], vec!["a", "", "c"]);
        assert_eq!(rows[1], vec!["", "", ""]);
        assert_eq!(rows[2], vec!["x", "y", "z"]);
    }

    #[test]
    fn handles_escaped_quotes_and_embedded_newlines() {
        let rows = parse_csv("\"say \"\"hi\"\"\",\"line1\nline2\"\n");
        assert_eq!(rows, vec![vec!["say \"hi\"".to_string(), "line1\nline2".to_string()]]);
    }

    #[test]
    fn percent_encodes_reserved_characters() {
        assert_eq!(percent_encode("'Price List'"), "%27Price%20List%27");
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
    }
}
