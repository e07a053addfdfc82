//! Builders for the complete SELECT statements sent to the executor.
//!
//! Every embedded predicate is wrapped as one parenthesized group, and
//! statements for multiple tables are joined with `;`.

use analytics_model::Source;

/// Separator for multi-statement queries.
pub const STATEMENT_SEPARATOR: &str = ";";

/// `SELECT * FROM <table> WHERE (<predicate>)` — unbounded search.
pub fn full_query(source: Source, predicate: &str) -> String {
    format!("SELECT * FROM {} WHERE ({predicate})", source.table())
}

/// `SELECT COUNT(*) FROM <table> WHERE (<predicate>)` — totals query.
pub fn count_query(source: Source, predicate: &str) -> String {
    format!("SELECT COUNT(*) FROM {} WHERE ({predicate})", source.table())
}

/// Cursor-bounded page query. `id > last_id` (keyset pagination) keeps
/// paging stable under concurrent inserts; ordering by the cursor key
/// keeps the max-id cursor advance exact.
pub fn keyset_query(source: Source, predicate: &str, last_id: i64, limit: u64) -> String {
    format!(
        "SELECT * FROM {} WHERE (id > {last_id} AND ({predicate})) ORDER BY id LIMIT {limit}",
        source.table()
    )
}
