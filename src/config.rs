//! Application configuration: the spreadsheet target, tab locators, and the
//! fixed business labels.
//!
//! The local SQLite settings table is authoritative. A remote per-account
//! mirror exists so a reinstalled device can pull its configuration back, but
//! it is consulted opportunistically and never blocks the operator.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::{self, DbState};
use crate::error::SheetsError;

const CONFIG_CATEGORY: &str = "app";
const CONFIG_KEY: &str = "config";

/// Everything the app needs to know about its spreadsheet and deployment.
/// Unknown fields in stored JSON are ignored and missing fields take their
/// defaults, so configs saved by older versions keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub spreadsheet_id: String,
    pub sales_sheet_gid: String,
    pub price_sheet_gid: String,
    pub payments_sheet_gid: String,
    pub drivers: Vec<String>,
    pub company_name: String,
    pub company_address: String,
    pub company_phone: String,
    pub loader1: String,
    pub loader2: String,
    pub submitted_by: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            spreadsheet_id: "1Ljddx01jdNdy7KPhO_8BCUMRmQ-iTznyA03DkJYOhMU".to_string(),
            sales_sheet_gid: "311399969".to_string(),
            price_sheet_gid: "1324216461".to_string(),
            payments_sheet_gid: "495567720".to_string(),
            drivers: vec![
                "DEPOT BULK".to_string(),
                "ALABI MUSIBAU".to_string(),
                "LAWAL WILLIAMS".to_string(),
            ],
            company_name: "Depot Sales Company".to_string(),
            company_address: "Warehouse 1 - A Load Out".to_string(),
            company_phone: "+234 XXX XXX XXXX".to_string(),
            loader1: "Auto".to_string(),
            loader2: "Auto".to_string(),
            submitted_by: "Auto".to_string(),
        }
    }
}

impl AppConfig {
    /// Preconditions for submitting an order. Checked before any network
    /// call; the catalog path has its own (looser) requirements.
    pub fn validate_for_submit(&self) -> Result<(), SheetsError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::Validation(
                "spreadsheet id is not configured".to_string(),
            ));
        }
        if self.sales_sheet_gid.trim().is_empty() || self.payments_sheet_gid.trim().is_empty() {
            return Err(SheetsError::Validation(
                "sales and payments tab locators are required".to_string(),
            ));
        }
        if self.drivers.is_empty() {
            return Err(SheetsError::Validation(
                "at least one driver must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local persistence
// ---------------------------------------------------------------------------

/// Load the stored config, merged over defaults. Missing or unreadable
/// stored config falls back to defaults with a log line, never an error.
pub fn load_config(db: &DbState) -> AppConfig {
    let conn = match db.conn.lock() {
        Ok(c) => c,
        Err(_) => {
            warn!("settings store lock poisoned, using default config");
            return AppConfig::default();
        }
    };
    match db::get_setting(&conn, CONFIG_CATEGORY, CONFIG_KEY) {
        Some(raw) => match serde_json::from_str::<AppConfig>(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "stored config unreadable, using defaults");
                AppConfig::default()
            }
        },
        None => AppConfig::default(),
    }
}

/// Persist the config to the settings table.
pub fn save_config(db: &DbState, config: &AppConfig) -> Result<(), String> {
    let raw = serde_json::to_string(config).map_err(|e| format!("serialize config: {e}"))?;
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    db::set_setting(&conn, CONFIG_CATEGORY, CONFIG_KEY, &raw)
}

// ---------------------------------------------------------------------------
// Remote mirror
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RemoteConfigRow {
    config: AppConfig,
}

#[derive(Serialize)]
struct RemoteConfigUpsert<'a> {
    account_id: &'a str,
    config: &'a AppConfig,
}

/// Per-account config mirror over a PostgREST-style store. Strictly best
/// effort: the local settings table stays authoritative.
pub struct RemoteConfigStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteConfigStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(|e| format!("HTTP client error: {e}"))?;
        Ok(RemoteConfigStore {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Fetch the mirrored config for an account, if one exists.
    pub async fn fetch(&self, account_id: &str) -> Result<Option<AppConfig>, String> {
        let url = format!(
            "{}/rest/v1/app_configs?account_id=eq.{}&select=config&limit=1",
            self.base_url,
            crate::sheets::percent_encode(account_id)
        );
        let resp = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| format!("config store request failed: {e}"))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("config store error ({status}): {body}"));
        }
        let rows: Vec<RemoteConfigRow> = resp
            .json()
            .await
            .map_err(|e| format!("config store JSON parse error: {e}"))?;
        Ok(rows.into_iter().next().map(|row| row.config))
    }

    /// Upsert the account's mirrored config.
    pub async fn push(&self, account_id: &str, config: &AppConfig) -> Result<(), String> {
        let url = format!("{}/rest/v1/app_configs", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&RemoteConfigUpsert { account_id, config })
            .send()
            .await
            .map_err(|e| format!("config store request failed: {e}"))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("config store error ({status}): {body}"));
        }
        Ok(())
    }
}

/// Build the remote mirror from stored credentials, when one was provisioned
/// for this install.
pub fn remote_store_from_keyring() -> Option<RemoteConfigStore> {
    let (url, key) = crate::storage::get_config_store()?;
    RemoteConfigStore::new(url, key).ok()
}

/// Refresh local config from the remote mirror when one is reachable. Local
/// config wins on any failure.
pub async fn sync_config_from_remote(
    db: &DbState,
    store: &RemoteConfigStore,
    account_id: &str,
) -> AppConfig {
    match store.fetch(account_id).await {
        Ok(Some(remote)) => {
            if let Err(e) = save_config(db, &remote) {
                warn!(error = %e, "failed to persist remote config locally");
            } else {
                info!("configuration refreshed from remote mirror");
            }
            remote
        }
        Ok(None) => load_config(db),
        Err(e) => {
            warn!(error = %e, "remote config unavailable, keeping local config");
            load_config(db)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use rusqlite::Connection;

    fn state() -> DbState {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::run_migrations(&conn).unwrap();
        DbState {
            conn: Mutex::new(conn),
            db_path: std::path::PathBuf::from(":memory:"),
        }
    }

    #[test]
    fn defaults_match_the_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.sales_sheet_gid, "311399969");
        assert_eq!(config.price_sheet_gid, "1324216461");
        assert_eq!(config.payments_sheet_gid, "495567720");
        assert_eq!(config.drivers.len(), 3);
        assert_eq!(config.drivers[0], "DEPOT BULK");
    }

    #[test]
    fn round_trips_through_the_settings_table() {
        let db = state();
        let mut config = AppConfig::default();
        config.company_name = "Another Depot".to_string();
        config.drivers.push("NEW DRIVER".to_string());

        save_config(&db, &config).unwrap();
        assert_eq!(load_config(&db), config);
    }

    #[test]
    fn missing_config_loads_defaults() {
        let db = state();
        assert_eq!(load_config(&db), AppConfig::default());
    }

    #[test]
    fn partial_stored_config_merges_with_defaults() {
        let db = state();
        {
            let conn = db.conn.lock().unwrap();
            db::set_setting(
                &conn,
                CONFIG_CATEGORY,
                CONFIG_KEY,
                r#"{"company_name":"Just This Field"}"#,
            )
            .unwrap();
        }
        let config = load_config(&db);
        assert_eq!(config.company_name, "Just This Field");
        assert_eq!(config.spreadsheet_id, AppConfig::default().spreadsheet_id);
    }

    #[test]
    fn corrupt_stored_config_falls_back_to_defaults() {
        let db = state();
        {
            let conn = db.conn.lock().unwrap();
            db::set_setting(&conn, CONFIG_CATEGORY, CONFIG_KEY, "{not json").unwrap();
        }
        assert_eq!(load_config(&db), AppConfig::default());
    }

    #[test]
    fn submit_validation_requires_target_and_drivers() {
        let mut config = AppConfig::default();
        assert!(config.validate_for_submit().is_ok());

        config.payments_sheet_gid = String::new();
        assert_eq!(
            config.validate_for_submit().unwrap_err().kind(),
            "validation_failed"
        );

        let mut no_drivers = AppConfig::default();
        no_drivers.drivers.clear();
        assert!(no_drivers.validate_for_submit().is_err());
    }
}
