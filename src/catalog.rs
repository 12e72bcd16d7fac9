//! Catalog source: priced SKUs read from the price tab, with a built-in
//! fallback list when the remote read fails.
//!
//! Every reload is a full refetch — no caching or staleness tracking. A
//! failed read never blocks the operator: `load_catalog` substitutes the
//! fallback list and logs, since stale pricing beats a stalled workflow.

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::SheetsError;
use crate::sheets::TabReader;
use crate::types::Sku;

/// Offline price list used when the price tab cannot be read.
/// (name, unit price, pack type, secondary pack label)
const FALLBACK_SKUS: [(&str, i64, &str, &str); 51] = [
    ("COKE 50CL PET", 4400, "PET", "12 x 50cl"),
    ("COKE 35CL RB", 3400, "RB", "24 x 35cl"),
    ("COKE 1L PET", 6200, "PET", "12 x 1L"),
    ("COKE 33CL CAN", 5600, "CAN", "24 x 33cl"),
    ("FANTA ORANGE 50CL PET", 4400, "PET", "12 x 50cl"),
    ("FANTA ORANGE 35CL RB", 3400, "RB", "24 x 35cl"),
    ("FANTA LEMON 50CL PET", 4400, "PET", "12 x 50cl"),
    ("FANTA 33CL CAN", 5600, "CAN", "24 x 33cl"),
    ("SPRITE 50CL PET", 4400, "PET", "12 x 50cl"),
    ("SPRITE 35CL RB", 3400, "RB", "24 x 35cl"),
    ("SPRITE 33CL CAN", 5600, "CAN", "24 x 33cl"),
    ("LIMCA 50CL PET", 4400, "PET", "12 x 50cl"),
    ("SCHWEPPES CHAPMAN 33CL CAN", 5800, "CAN", "24 x 33cl"),
    ("SCHWEPPES MOJITO 33CL CAN", 5800, "CAN", "24 x 33cl"),
    ("SCHWEPPES SODA WATER 33CL CAN", 5400, "CAN", "24 x 33cl"),
    ("PEPSI 50CL PET", 4200, "PET", "12 x 50cl"),
    ("PEPSI 35CL RB", 3200, "RB", "24 x 35cl"),
    ("PEPSI 33CL CAN", 5400, "CAN", "24 x 33cl"),
    ("MIRINDA ORANGE 50CL PET", 4200, "PET", "12 x 50cl"),
    ("7UP 50CL PET", 4200, "PET", "12 x 50cl"),
    ("7UP 33CL CAN", 5400, "CAN", "24 x 33cl"),
    ("TEEM BITTER LEMON 33CL CAN", 5400, "CAN", "24 x 33cl"),
    ("LACASERA APPLE 50CL PET", 4000, "PET", "12 x 50cl"),
    ("BIGI COLA 60CL PET", 3600, "PET", "12 x 60cl"),
    ("BIGI APPLE 60CL PET", 3600, "PET", "12 x 60cl"),
    ("BIGI CHAPMAN 60CL PET", 3600, "PET", "12 x 60cl"),
    ("EVA WATER 75CL", 2600, "PET", "12 x 75cl"),
    ("EVA WATER 1.5L", 3200, "PET", "12 x 1.5L"),
    ("AQUAFINA 75CL", 2400, "PET", "12 x 75cl"),
    ("AQUAFINA 1.5L", 3000, "PET", "12 x 1.5L"),
    ("MALTINA 33CL CAN", 7800, "CAN", "24 x 33cl"),
    ("MALTINA 33CL RB", 6800, "RB", "24 x 33cl"),
    ("AMSTEL MALTA 33CL CAN", 7600, "CAN", "24 x 33cl"),
    ("AMSTEL MALTA 33CL RB", 6600, "RB", "24 x 33cl"),
    ("MALTA GUINNESS 33CL CAN", 7800, "CAN", "24 x 33cl"),
    ("MALTA GUINNESS 33CL RB", 6800, "RB", "24 x 33cl"),
    ("GRAND MALT 33CL CAN", 7200, "CAN", "24 x 33cl"),
    ("HI-MALT 33CL CAN", 7000, "CAN", "24 x 33cl"),
    ("CHIVITA ORANGE 1L", 9600, "CARTON", "12 x 1L"),
    ("CHIVITA EXOTIC 1L", 9600, "CARTON", "12 x 1L"),
    ("HOLLANDIA YOGHURT 1L", 10400, "CARTON", "12 x 1L"),
    ("5ALIVE PULPY ORANGE 85CL", 8800, "CARTON", "12 x 85cl"),
    ("CAPRISONNE APPLE 20CL", 6400, "CARTON", "40 x 20cl"),
    ("RIBENA BLACKCURRANT 28.7CL", 9200, "CARTON", "24 x 28.7cl"),
    ("CLIMAX ENERGY 33CL CAN", 8400, "CAN", "24 x 33cl"),
    ("POWER HORSE 25CL CAN", 16800, "CAN", "24 x 25cl"),
    ("RED BULL 25CL CAN", 20400, "CAN", "24 x 25cl"),
    ("FEARLESS ENERGY 50CL PET", 7200, "PET", "12 x 50cl"),
    ("MONSTER ENERGY 44CL CAN", 18000, "CAN", "24 x 44cl"),
    ("NUTRI MILK CHOCO 31CL", 11200, "CARTON", "24 x 31cl"),
    ("VIJU MILK DRINK 50CL", 9800, "CARTON", "12 x 50cl"),
];

/// The built-in catalog, used whenever the remote read fails.
pub fn fallback_catalog() -> Vec<Sku> {
    FALLBACK_SKUS
        .iter()
        .enumerate()
        .map(|(i, (name, price, pack, pack2))| Sku {
            id: format!("sku-{i}"),
            name: (*name).to_string(),
            unit_price: *price,
            pack_type: (*pack).to_string(),
            pack_type2: (*pack2).to_string(),
        })
        .collect()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn parse_price(raw: &str) -> i64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != ' ').collect();
    cleaned.parse::<f64>().map(|v| v.round() as i64).unwrap_or(0)
}

/// Map raw price-tab rows to SKUs. Row 0 is the header and is skipped;
/// fully blank rows (trailing padding in the sheet) are discarded.
fn parse_catalog(rows: &[Vec<String>]) -> Vec<Sku> {
    rows.iter()
        .skip(1)
        .filter(|row| !is_blank_row(row))
        .enumerate()
        .map(|(i, row)| Sku {
            id: format!("sku-{i}"),
            name: row.first().cloned().unwrap_or_default(),
            unit_price: row.get(1).map(|c| parse_price(c)).unwrap_or(0),
            pack_type: row.get(2).cloned().unwrap_or_default(),
            pack_type2: row.get(3).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Fetch the catalog from the price tab. Fails with `CatalogUnavailable`
/// when the remote read errors; callers that prefer the fallback behaviour
/// use `load_catalog` instead.
pub async fn fetch_catalog<R: TabReader>(
    reader: &R,
    config: &AppConfig,
) -> Result<Vec<Sku>, SheetsError> {
    if config.spreadsheet_id.trim().is_empty() || config.price_sheet_gid.trim().is_empty() {
        return Err(SheetsError::Validation(
            "spreadsheet id and price tab locator are required".to_string(),
        ));
    }
    let rows = reader
        .read_tab(&config.spreadsheet_id, &config.price_sheet_gid)
        .await?;
    Ok(parse_catalog(&rows))
}

/// Fetch the catalog, substituting the built-in list on failure. Never
/// raises: a broken read is logged and the operator keeps working.
pub async fn load_catalog<R: TabReader>(reader: &R, config: &AppConfig) -> Vec<Sku> {
    match fetch_catalog(reader, config).await {
        Ok(skus) => {
            info!(count = skus.len(), "catalog loaded from price tab");
            skus
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "catalog read failed, using fallback list");
            fallback_catalog()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl TabReader for FailingReader {
        async fn read_tab(
            &self,
            _spreadsheet_id: &str,
            _gid: &str,
        ) -> Result<Vec<Vec<String>>, SheetsError> {
            Err(SheetsError::CatalogUnavailable("connection refused".into()))
        }
    }

    struct FixedReader(Vec<Vec<String>>);

    impl TabReader for FixedReader {
        async fn read_tab(
            &self,
            _spreadsheet_id: &str,
            _gid: &str,
        ) -> Result<Vec<Vec<String>>, SheetsError> {
            Ok(self.0.clone())
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn fallback_list_has_fifty_one_skus() {
        let skus = fallback_catalog();
        assert_eq!(skus.len(), 51);
        assert!(skus.iter().any(|s| s.unit_price == 4400));
        assert!(skus.iter().any(|s| s.unit_price == 5800));
    }

    #[test]
    fn skips_header_and_blank_rows() {
        let rows = vec![
            row(&["SKU", "PRICE", "PACK", "PACK2"]),
            row(&["COKE 50CL PET", "4400", "PET", "12 x 50cl"]),
            row(&["", "", "", ""]),
            row(&["SCHWEPPES CHAPMAN 33CL CAN", "5,800", "CAN"]),
            row(&["  ", "", ""]),
        ];
        let skus = parse_catalog(&rows);
        assert_eq!(skus.len(), 2);
        assert_eq!(skus[0].name, "COKE 50CL PET");
        assert_eq!(skus[0].unit_price, 4400);
        assert_eq!(skus[1].unit_price, 5800);
        assert_eq!(skus[1].pack_type2, "");
    }

    #[test]
    fn unparsable_prices_become_zero() {
        let rows = vec![row(&["SKU", "PRICE"]), row(&["MYSTERY", "n/a"])];
        let skus = parse_catalog(&rows);
        assert_eq!(skus[0].unit_price, 0);
    }

    #[tokio::test]
    async fn load_catalog_falls_back_without_raising() {
        let config = AppConfig::default();
        let skus = load_catalog(&FailingReader, &config).await;
        assert_eq!(skus.len(), 51);
    }

    #[tokio::test]
    async fn load_catalog_uses_remote_rows_when_available() {
        let config = AppConfig::default();
        let reader = FixedReader(vec![
            row(&["SKU", "PRICE", "PACK", "PACK2"]),
            row(&["COKE 50CL PET", "4400", "PET", "12 x 50cl"]),
        ]);
        let skus = load_catalog(&reader, &config).await;
        assert_eq!(skus.len(), 1);
        assert_eq!(skus[0].id, "sku-0");
    }

    #[tokio::test]
    async fn fetch_catalog_requires_config() {
        let mut config = AppConfig::default();
        config.spreadsheet_id = String::new();
        let err = fetch_catalog(&FailingReader, &config).await.unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
    }
}
