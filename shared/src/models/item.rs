//! Stock ledger item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item and its authoritative on-hand quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    /// Unique human-readable SKU (e.g., "A001")
    pub code: String,
    pub name: String,
    pub category: String,
    /// On-hand count, never negative
    pub quantity: i64,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a new item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub code: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub quantity: i64,
    pub location: Option<String>,
}

/// Editable item metadata; quantity is only changed through stock increments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub code: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Item {
    /// Case-insensitive substring match on code or name.
    /// Items missing a code or name never match.
    pub fn matches_search(&self, term: &str) -> bool {
        if self.code.is_empty() || self.name.is_empty() {
            return false;
        }
        let term = term.to_lowercase();
        self.code.to_lowercase().contains(&term) || self.name.to_lowercase().contains(&term)
    }

    /// Apply metadata changes, leaving unset fields untouched
    pub fn apply_metadata(&mut self, metadata: &ItemMetadata) {
        if let Some(code) = &metadata.code {
            self.code = code.clone();
        }
        if let Some(name) = &metadata.name {
            self.name = name.clone();
        }
        if let Some(location) = &metadata.location {
            self.location = if location.is_empty() {
                None
            } else {
                Some(location.clone())
            };
        }
    }
}

/// Filter a catalog (already ordered by code) for line-item selection
pub fn search_catalog(items: Vec<Item>, term: Option<&str>) -> Vec<Item> {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        Some(term) => items.into_iter().filter(|i| i.matches_search(term)).collect(),
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, name: &str) -> Item {
        Item {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            category: "Sparepart".to_string(),
            quantity: 0,
            location: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_search_matches_code_and_name_case_insensitive() {
        let bolt = item("A001", "Baut M10");
        assert!(bolt.matches_search("a00"));
        assert!(bolt.matches_search("BAUT"));
        assert!(!bolt.matches_search("mur"));
    }

    #[test]
    fn test_search_skips_incomplete_items() {
        let broken = item("", "Tanpa kode");
        assert!(!broken.matches_search("tanpa"));
    }

    #[test]
    fn test_search_catalog_blank_term_returns_all() {
        let items = vec![item("A001", "Baut"), item("B002", "Mur")];
        assert_eq!(search_catalog(items.clone(), Some("  ")).len(), 2);
        assert_eq!(search_catalog(items.clone(), None).len(), 2);
        let found = search_catalog(items, Some("mur"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "B002");
    }

    #[test]
    fn test_apply_metadata_clears_empty_location() {
        let mut bolt = item("A001", "Baut");
        bolt.location = Some("Rak 1".to_string());
        bolt.apply_metadata(&ItemMetadata {
            name: Some("Baut M12".to_string()),
            location: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(bolt.name, "Baut M12");
        assert_eq!(bolt.code, "A001");
        assert_eq!(bolt.location, None);
    }
}
