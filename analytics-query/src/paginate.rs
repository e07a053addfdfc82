//! Cross-source pagination: page-budget allocation between the two
//! tables, bounded statement assembly, and result interpretation.

use analytics_model::{AnalyticsRow, FilterCriterion, MatchMode, Source, SourceSelector};

use crate::predicate::compile_all;
use crate::statement::{self, STATEMENT_SEPARATOR};
use crate::QueryError;

/// Mutable session state for one limited search.
///
/// Cursors (`last_items_id`, `last_counters_id`) are monotonically
/// non-decreasing. Fetched counts never exceed their totals as long as
/// the server honors the emitted LIMITs. State is only mutated after a
/// successful fetch has been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub items_total: u64,
    pub counters_total: u64,
    pub items_fetched: u64,
    pub counters_fetched: u64,
    pub last_items_id: i64,
    pub last_counters_id: i64,
    /// Target rows per page, user-configurable.
    pub page_limit: u64,
    /// Cumulative rows fetched across both tables.
    pub current_fetch_count: u64,
    /// `current_fetch_count` before the latest page, for "X-Y of Z".
    pub last_fetch_count: u64,
}

impl PaginationState {
    pub fn new(page_limit: u64) -> Self {
        Self {
            items_total: 0,
            counters_total: 0,
            items_fetched: 0,
            counters_fetched: 0,
            last_items_id: 0,
            last_counters_id: 0,
            page_limit,
            current_fetch_count: 0,
            last_fetch_count: 0,
        }
    }

    /// Zero everything except the page limit. Called whenever the
    /// filter set, source selector, or match mode changes.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_limit);
    }

    pub fn total_count(&self) -> u64 {
        self.items_total + self.counters_total
    }

    pub fn remaining(&self, source: Source) -> u64 {
        match source {
            Source::Items => self.items_total.saturating_sub(self.items_fetched),
            Source::Counters => self.counters_total.saturating_sub(self.counters_fetched),
        }
    }

    /// True while further pages can still return rows.
    pub fn has_more(&self) -> bool {
        self.current_fetch_count < self.total_count()
    }

    pub fn set_totals(&mut self, items_total: u64, counters_total: u64) {
        self.items_total = items_total;
        self.counters_total = counters_total;
    }
}

/// Per-table row limits for one bounded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub items: u64,
    pub counters: u64,
}

impl PageLimits {
    pub fn for_source(self, source: Source) -> u64 {
        match source {
            Source::Items => self.items,
            Source::Counters => self.counters,
        }
    }
}

/// Split the page budget between the two tables.
///
/// A single selected table gets the whole budget. With both selected,
/// the budget is divided proportionally over each table's remaining
/// rows (capped at the budget so one huge table cannot starve the
/// other), each share is capped at its own remaining count, and floor
/// division is corrected by topping up whichever table still has
/// unfetched rows until the shares sum to the budget. When nothing
/// remains at all, the requested tables get the full budget as a safe
/// default; the fetch simply returns no rows. A zero budget allocates
/// nothing to either table.
pub fn allocate_limits(state: &PaginationState, selector: SourceSelector) -> PageLimits {
    let page = state.page_limit;
    if page == 0 {
        return PageLimits { items: 0, counters: 0 };
    }
    match selector {
        SourceSelector::Items => PageLimits { items: page, counters: 0 },
        SourceSelector::Counters => PageLimits { items: 0, counters: page },
        SourceSelector::Both => {
            let items_remaining = state.remaining(Source::Items);
            let counters_remaining = state.remaining(Source::Counters);
            if items_remaining + counters_remaining == 0 {
                return PageLimits { items: page, counters: page };
            }

            let items_share = items_remaining.min(page);
            let counters_share = counters_remaining.min(page);
            let pool = items_share + counters_share;

            let mut items = (page * items_share / pool).min(items_remaining);
            let mut counters = (page * counters_share / pool).min(counters_remaining);

            // Floor division under-allocates by a few rows; hand the
            // slack to whichever table still has capacity.
            while items + counters < page && (items < items_remaining || counters < counters_remaining)
            {
                if items < items_remaining {
                    items += 1;
                } else {
                    counters += 1;
                }
            }

            PageLimits { items, counters }
        }
    }
}

/// `SELECT *` statements for an unbounded search, `;`-joined.
pub fn full_search_sql(
    criteria: &[FilterCriterion],
    mode: MatchMode,
    selector: SourceSelector,
) -> Result<String, QueryError> {
    let predicate = compile_all(criteria, mode)?;
    let statements: Vec<String> = selector
        .sources()
        .iter()
        .map(|&source| statement::full_query(source, &predicate))
        .collect();
    Ok(statements.join(STATEMENT_SEPARATOR))
}

/// `SELECT COUNT(*)` statements populating the totals, `;`-joined.
pub fn totals_sql(
    criteria: &[FilterCriterion],
    mode: MatchMode,
    selector: SourceSelector,
) -> Result<String, QueryError> {
    let predicate = compile_all(criteria, mode)?;
    let statements: Vec<String> = selector
        .sources()
        .iter()
        .map(|&source| statement::count_query(source, &predicate))
        .collect();
    Ok(statements.join(STATEMENT_SEPARATOR))
}

/// Cursor-bounded statements for the next page, `;`-joined. Tables
/// whose computed limit is zero emit no statement.
pub fn limited_search_sql(
    criteria: &[FilterCriterion],
    mode: MatchMode,
    selector: SourceSelector,
    state: &PaginationState,
) -> Result<String, QueryError> {
    let predicate = compile_all(criteria, mode)?;
    let limits = allocate_limits(state, selector);

    let mut statements = Vec::new();
    for &source in selector.sources() {
        let limit = limits.for_source(source);
        if limit == 0 {
            continue;
        }
        let last_id = match source {
            Source::Items => state.last_items_id,
            Source::Counters => state.last_counters_id,
        };
        statements.push(statement::keyset_query(source, &predicate, last_id, limit));
    }
    Ok(statements.join(STATEMENT_SEPARATOR))
}

/// Interpret the array-mode response to the totals query. Counts arrive
/// one row per statement, in statement order: items first when
/// selected, counters last when selected.
pub fn apply_totals(
    state: &mut PaginationState,
    selector: SourceSelector,
    scalars: &[Vec<String>],
) -> Result<(), QueryError> {
    let expected = selector.sources().len();
    if scalars.len() != expected {
        return Err(QueryError::MalformedTotals(format!(
            "expected {expected} count rows, got {}",
            scalars.len()
        )));
    }

    let mut items_total = 0;
    let mut counters_total = 0;
    for (&source, row) in selector.sources().iter().zip(scalars) {
        let count = row
            .first()
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| QueryError::MalformedTotals(format!("unparseable count row {row:?}")))?;
        match source {
            Source::Items => items_total = count,
            Source::Counters => counters_total = count,
        }
    }
    state.set_totals(items_total, counters_total);
    Ok(())
}

/// Summary of one interpreted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    pub rows_fetched: usize,
    /// 1-based range of the rows this page covers, for "X-Y of Z". A
    /// page with no rows reports `first_row == last_row + 1`.
    pub first_row: u64,
    pub last_row: u64,
    pub total: u64,
    /// False exactly when the cumulative count has reached the total.
    pub has_more: bool,
}

/// Advance cursors and running totals from a successful page fetch.
///
/// Each table's cursor moves to the maximum id it contributed this
/// step; a table that contributed nothing keeps its cursor. Must only
/// be called with the rows of a successful response; failures leave
/// the state untouched by never reaching this point.
pub fn interpret_page(state: &mut PaginationState, rows: &[AnalyticsRow]) -> PageOutcome {
    let mut items_count = 0u64;
    let mut counters_count = 0u64;

    for row in rows {
        match row.source {
            Source::Items => {
                items_count += 1;
                state.last_items_id = state.last_items_id.max(row.id);
            }
            Source::Counters => {
                counters_count += 1;
                state.last_counters_id = state.last_counters_id.max(row.id);
            }
        }
    }

    state.items_fetched += items_count;
    state.counters_fetched += counters_count;
    state.last_fetch_count = state.current_fetch_count;
    state.current_fetch_count += items_count + counters_count;

    PageOutcome {
        rows_fetched: rows.len(),
        first_row: state.last_fetch_count + 1,
        last_row: state.current_fetch_count,
        total: state.total_count(),
        has_more: state.has_more(),
    }
}
