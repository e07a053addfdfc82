//! Query predicate compiler and cross-source paginator.
//!
//! Turns typed filter criteria into safe SQL predicate fragments and
//! assembles cursor-bounded statements over the `items` and `counters`
//! tables. SQL is executed elsewhere, behind [`QueryExecutor`]; this
//! crate only builds statement text and interprets returned rows.

pub mod paginate;
pub mod predicate;
pub mod statement;

use analytics_model::{AnalyticsRow, Comparison, QueryField};

pub use paginate::{PageLimits, PageOutcome, PaginationState};

/// Abstraction over whatever runs a SQL string against the backing
/// store. The two methods correspond to the endpoint's result-shape
/// modes: column-keyed row maps for data queries, bare string arrays
/// for scalar queries such as COUNT.
pub trait QueryExecutor {
    /// Run `sql` and return decoded rows tagged by source table and id.
    fn fetch_rows(&self, sql: &str) -> Result<Vec<AnalyticsRow>, ExecutorError>;

    /// Run `sql` and return rows as positional string arrays.
    fn fetch_scalars(&self, sql: &str) -> Result<Vec<Vec<String>>, ExecutorError>;
}

/// Failures surfaced by an executor. The paginator treats them all the
/// same way: the step is aborted and pagination state is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("bad endpoint URL: {0}")]
    BadEndpoint(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("server returned an empty body")]
    EmptyBody,
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A search was attempted with no criteria carrying a non-empty
    /// value. Detected locally, before any request is issued.
    #[error("no criteria with a non-empty value")]
    EmptyFilter,
    /// Contract violation: the criterion's operator family does not
    /// match its field's value family.
    #[error("operator {comparison:?} does not apply to field {field:?}")]
    OperatorMismatch {
        field: QueryField,
        comparison: Comparison,
    },
    #[error("unexpected totals response: {0}")]
    MalformedTotals(String),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}
