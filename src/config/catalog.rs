use serde::Deserialize;
use serde::Serialize;

/// One bibliographic record served by the bundled executor
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub year: u32,
    pub author: String,
    pub title: String,
}

/// Seed data for [`Catalog`](crate::query::Catalog)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub records: Vec<DocumentRecord>,
}
