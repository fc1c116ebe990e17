//! Region database resolver: six independent serial-number -> title maps,
//! loaded once and consulted in a fixed order.

use disc_id_core::{DiscError, Region};
use std::collections::HashMap;
use std::path::Path;

/// The six region catalogs, keyed by canonical serial number.
pub struct Database {
    tables: HashMap<Region, HashMap<String, String>>,
}

impl Database {
    /// Load all six `db_playstation2_official_<code>.json` files from
    /// `dir`, where `<code>` is the region's lowercase two-letter code
    /// (`as`, `au`, `eu`, `jp`, `ko`, `us`).
    pub fn load_dir(dir: &Path) -> Result<Self, DiscError> {
        let mut tables = HashMap::new();
        for region in Region::resolution_order() {
            let path = dir.join(format!(
                "db_playstation2_official_{}.json",
                region.code().to_lowercase()
            ));
            let contents = std::fs::read_to_string(&path)?;
            let table: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| DiscError::corrupt(format!("{}: {e}", path.display())))?;
            tables.insert(region, table);
        }
        Ok(Self { tables })
    }

    /// Build a database directly from in-memory tables (used by tests and
    /// callers that already have the catalogs loaded).
    pub fn from_tables(tables: HashMap<Region, HashMap<String, String>>) -> Self {
        Self { tables }
    }

    /// Resolve a canonical serial number against the six regions in fixed
    /// order (Asia, Australia, Europe, Japan, Korea, USA); the first hit
    /// wins.
    pub fn resolve(&self, serial: &str) -> Option<(Region, String)> {
        for region in Region::resolution_order() {
            if let Some(title) = self.tables.get(&region).and_then(|table| table.get(serial)) {
                return Some((region, title.clone()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> Database {
        let mut tables = HashMap::new();
        let mut us = HashMap::new();
        us.insert("SLUS-12345".to_string(), "Example Game".to_string());
        tables.insert(Region::Usa, us);
        let mut jp = HashMap::new();
        jp.insert("SLUS-12345".to_string(), "Wrong Region Duplicate".to_string());
        tables.insert(Region::Japan, jp);
        Database::from_tables(tables)
    }

    #[test]
    fn resolves_known_serial() {
        let db = sample_db();
        let (region, title) = db.resolve("SLUS-12345").unwrap();
        assert_eq!(region, Region::Japan);
        assert_eq!(title, "Wrong Region Duplicate");
    }

    #[test]
    fn returns_none_for_unknown_serial() {
        let db = sample_db();
        assert!(db.resolve("SLUS-99999").is_none());
    }
}
