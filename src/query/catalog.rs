use tracing::debug;

use super::Query;
use super::QueryExecutor;
use crate::constants::FIELD_DELIMITER;
use crate::constants::RESULT_IS_NULL;
use crate::CatalogConfig;
use crate::DocumentRecord;
use crate::QueryError;

/// In-memory document catalog.
///
/// Result shapes:
/// - list all: `year | author | title | ` per record, ordered by year
/// - by year: `author | title | `
/// - by author: `year | title | `
///
/// Every record ends with a newline. An empty result is `Result is NULL !`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<DocumentRecord>,
}

impl Catalog {
    pub fn new(mut records: Vec<DocumentRecord>) -> Self {
        // stable: equal years keep insertion order
        records.sort_by_key(|r| r.year);
        Self { records }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.records.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl QueryExecutor for Catalog {
    fn execute(
        &self,
        query: &Query,
    ) -> Result<String, QueryError> {
        let rows: Vec<Vec<String>> = match query {
            Query::ListAll => self
                .records
                .iter()
                .map(|r| vec![r.year.to_string(), r.author.clone(), r.title.clone()])
                .collect(),
            Query::ByYear(year) => {
                let year: u32 = year
                    .trim()
                    .parse()
                    .map_err(|_| QueryError::Backend(format!("invalid year {:?}", year)))?;
                self.records
                    .iter()
                    .filter(|r| r.year == year)
                    .map(|r| vec![r.author.clone(), r.title.clone()])
                    .collect()
            }
            Query::ByAuthor(author) => self
                .records
                .iter()
                .filter(|r| r.author == *author)
                .map(|r| vec![r.year.to_string(), r.title.clone()])
                .collect(),
        };

        debug!(opcode = query.opcode(), rows = rows.len(), "catalog query");
        Ok(format_rows(&rows))
    }
}

/// Joins each field with the delimiter (trailing one included) and ends every
/// row with a newline.
pub fn format_rows(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return RESULT_IS_NULL.to_string();
    }

    let mut out = String::new();
    for row in rows {
        for field in row {
            out.push_str(field);
            out.push_str(FIELD_DELIMITER);
        }
        out.push('\n');
    }
    out
}
