//! Search-session orchestration over a remote query executor.
//!
//! A [`SearchSession`] owns the user's filter criteria and one
//! [`PaginationState`], drives the totals-then-pages request sequence,
//! and guarantees that state only ever changes after a successful
//! fetch has been interpreted.

pub mod http;
pub mod persistence;

use analytics_model::{
    AnalyticsRow, FilterCriterion, MatchMode, SavedQuery, SourceSelector,
};
use analytics_query::paginate::{
    apply_totals, full_search_sql, interpret_page, limited_search_sql, totals_sql, PageOutcome,
    PaginationState,
};
use analytics_query::{QueryError, QueryExecutor};
use tracing::{debug, info};
use uuid::Uuid;

pub use http::HttpExecutor;
pub use persistence::{
    load_query, save_query, with_saved_query_extension, PersistenceError, SAVED_QUERY_EXTENSION,
};

/// Rows and progress for one fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Vec<AnalyticsRow>,
    pub outcome: PageOutcome,
    /// Session generation the fetch was issued under; see
    /// [`SearchSession::is_current`].
    pub generation: u64,
}

/// One active search against the two analytics tables.
///
/// The session is owned by a single caller and never shared; fetch
/// steps are sequential. Editing the criteria, match mode, or source
/// selector resets the pagination state and bumps the generation
/// counter, so results of a fetch issued under an older generation can
/// be recognized and discarded instead of merged.
pub struct SearchSession<E: QueryExecutor> {
    executor: E,
    criteria: Vec<FilterCriterion>,
    match_mode: MatchMode,
    selector: SourceSelector,
    state: PaginationState,
    generation: u64,
    totals_loaded: bool,
}

impl<E: QueryExecutor> SearchSession<E> {
    /// A zero `page_limit` is clamped to one row per page.
    pub fn new(executor: E, page_limit: u64) -> Self {
        Self {
            executor,
            criteria: Vec::new(),
            match_mode: MatchMode::All,
            selector: SourceSelector::Both,
            state: PaginationState::new(page_limit.max(1)),
            generation: 1,
            totals_loaded: false,
        }
    }

    /// Session preloaded from a persisted filter set.
    pub fn from_saved(executor: E, saved: &SavedQuery) -> Self {
        let mut session = Self::new(executor, saved.page_limit);
        session.criteria = saved.criteria.clone();
        session.match_mode = saved.match_mode;
        session.selector = saved.sources;
        session
    }

    pub fn criteria(&self) -> &[FilterCriterion] {
        &self.criteria
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn selector(&self) -> SourceSelector {
        self.selector
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when `page` belongs to the session's current generation;
    /// stale pages must be discarded, never merged.
    pub fn is_current(&self, page: &Page) -> bool {
        page.generation == self.generation
    }

    pub fn saved_query(&self, is_limited: bool) -> SavedQuery {
        SavedQuery {
            criteria: self.criteria.clone(),
            match_mode: self.match_mode,
            sources: self.selector,
            is_limited,
            page_limit: self.state.page_limit,
        }
    }

    pub fn set_criteria(&mut self, criteria: Vec<FilterCriterion>) {
        self.criteria = criteria;
        self.invalidate();
    }

    /// Replace the criterion with the same id in place, or append.
    pub fn upsert_criterion(&mut self, criterion: FilterCriterion) {
        match self.criteria.iter_mut().find(|c| c.id == criterion.id) {
            Some(existing) => *existing = criterion,
            None => self.criteria.push(criterion),
        }
        self.invalidate();
    }

    pub fn remove_criterion(&mut self, id: Uuid) {
        self.criteria.retain(|c| c.id != id);
        self.invalidate();
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) {
        if self.match_mode != mode {
            self.match_mode = mode;
            self.invalidate();
        }
    }

    pub fn set_selector(&mut self, selector: SourceSelector) {
        if self.selector != selector {
            self.selector = selector;
            self.invalidate();
        }
    }

    /// A zero limit is clamped to one row per page.
    pub fn set_page_limit(&mut self, page_limit: u64) {
        self.state.page_limit = page_limit.max(1);
    }

    fn invalidate(&mut self) {
        self.state.reset();
        self.totals_loaded = false;
        self.generation += 1;
    }

    /// Unbounded search: no totals, no cursors, pagination state ignored.
    pub fn full_search(&self) -> Result<Vec<AnalyticsRow>, QueryError> {
        let sql = full_search_sql(&self.criteria, self.match_mode, self.selector)?;
        debug!(%sql, "running full search");
        let rows = self.executor.fetch_rows(&sql)?;
        info!(rows = rows.len(), "full search completed");
        Ok(rows)
    }

    /// Start a limited search: fetch match totals for each selected
    /// table, then the first page. Validation happens before any
    /// request leaves the session.
    pub fn begin_limited(&mut self) -> Result<Page, QueryError> {
        self.invalidate();

        let count_sql = totals_sql(&self.criteria, self.match_mode, self.selector)?;
        debug!(sql = %count_sql, "fetching search totals");

        // Work on a staged copy so a failing step leaves the session
        // state exactly as it was.
        let mut staged = self.state.clone();
        let scalars = self.executor.fetch_scalars(&count_sql)?;
        apply_totals(&mut staged, self.selector, &scalars)?;
        info!(total = staged.total_count(), "search totals loaded");

        self.fetch_page(staged)
    }

    /// Fetch the next page of a limited search already in progress.
    /// When no pages remain, returns an empty page without contacting
    /// the executor; its range stays 1-based and reports
    /// `first_row == last_row + 1`, the same shape an interpreted
    /// zero-row page would carry.
    pub fn next_page(&mut self) -> Result<Page, QueryError> {
        if !self.totals_loaded {
            return self.begin_limited();
        }
        if !self.state.has_more() {
            debug!("no pages remain; skipping fetch");
            return Ok(Page {
                rows: Vec::new(),
                outcome: PageOutcome {
                    rows_fetched: 0,
                    first_row: self.state.current_fetch_count + 1,
                    last_row: self.state.current_fetch_count,
                    total: self.state.total_count(),
                    has_more: false,
                },
                generation: self.generation,
            });
        }

        self.fetch_page(self.state.clone())
    }

    fn fetch_page(&mut self, mut staged: PaginationState) -> Result<Page, QueryError> {
        let generation = self.generation;
        let sql = limited_search_sql(&self.criteria, self.match_mode, self.selector, &staged)?;
        debug!(%sql, "fetching page");

        let rows = self.executor.fetch_rows(&sql)?;
        let outcome = interpret_page(&mut staged, &rows);
        info!(
            first = outcome.first_row,
            last = outcome.last_row,
            total = outcome.total,
            has_more = outcome.has_more,
            "page interpreted"
        );

        // Commit only after every step succeeded.
        self.state = staged;
        self.totals_loaded = true;

        Ok(Page {
            rows,
            outcome,
            generation,
        })
    }
}
