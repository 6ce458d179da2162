//! Boundary to the query collaborator.
//!
//! The server only knows how to turn a request into a [`Query`] and how to
//! send back whatever text the [`QueryExecutor`] produces.
mod catalog;

pub use catalog::*;


#[cfg(test)]
use mockall::automock;

use crate::constants::OPCODE_BY_AUTHOR;
use crate::constants::OPCODE_BY_YEAR;
use crate::constants::OPCODE_LIST_ALL;
use crate::QueryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// opcode 0
    ListAll,
    /// opcode 1
    ByYear(String),
    /// opcode 2
    ByAuthor(String),
}

impl Query {
    /// Maps a wire opcode and its parameter to a query. Unknown opcodes map to `None`.
    pub fn from_opcode(
        opcode: i64,
        parameter: &str,
    ) -> Option<Self> {
        match opcode {
            OPCODE_LIST_ALL => Some(Query::ListAll),
            OPCODE_BY_YEAR => Some(Query::ByYear(parameter.to_string())),
            OPCODE_BY_AUTHOR => Some(Query::ByAuthor(parameter.to_string())),
            _ => None,
        }
    }

    pub fn opcode(&self) -> i64 {
        match self {
            Query::ListAll => OPCODE_LIST_ALL,
            Query::ByYear(_) => OPCODE_BY_YEAR,
            Query::ByAuthor(_) => OPCODE_BY_AUTHOR,
        }
    }
}

/// Resolves a query into formatted result text.
///
/// Called synchronously from a worker thread; it may block for as long as it
/// needs, during which that worker serves no other connection.
#[cfg_attr(test, automock)]
pub trait QueryExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        query: &Query,
    ) -> Result<String, QueryError>;
}
