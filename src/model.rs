use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::column::Column;
use crate::domain::{EngineConfig, Message, PageState, SortDirection, SortSpec, ViewError, ViewState};
use crate::value::Value;

/// The page of rows the presentation layer should render.
#[derive(Debug, PartialEq)]
pub struct ViewResult<'a, R> {
    pub rows: Vec<&'a R>,
    /// Position of each visible row in the source collection.
    pub row_indices: Vec<usize>,
    pub total_filtered: usize,
    pub page_count: usize,
    pub page_index: usize,
    pub page_size: usize,
}

impl<R> ViewResult<'_, R> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Searches, sorts and pages an in-memory record collection.
///
/// Every mutating operation validates its input first and then re-derives the
/// filtered and sorted row mapping, so `view()` always reflects the latest inputs.
/// Rejected operations leave the engine exactly as it was.
pub struct TableView<R> {
    records: Vec<R>,
    columns: Vec<Column<R>>,
    config: EngineConfig,
    state: ViewState,
    filtered: Vec<usize>, // Source indices passing the filters, in source order
    rows: Vec<usize>,     // `filtered` after sorting
    generation: u64,
}

impl<R: Sync> TableView<R> {
    pub fn new(records: Vec<R>, columns: Vec<Column<R>>, page_size: usize) -> Result<Self, ViewError> {
        Self::with_config(records, columns, page_size, EngineConfig::default())
    }

    pub fn with_config(
        records: Vec<R>,
        columns: Vec<Column<R>>,
        page_size: usize,
        config: EngineConfig,
    ) -> Result<Self, ViewError> {
        Self::validate_page_size(page_size)?;
        let mut keys = HashSet::new();
        for column in columns.iter() {
            if column.key().is_empty() {
                return Err(ViewError::InvalidColumn("column key must not be empty".into()));
            }
            if !keys.insert(column.key()) {
                return Err(ViewError::InvalidColumn(format!(
                    "duplicate column key \"{}\"",
                    column.key()
                )));
            }
        }

        let mut view = Self {
            records,
            columns,
            config,
            state: ViewState {
                page: PageState {
                    page_index: 0,
                    page_size,
                },
                ..ViewState::default()
            },
            filtered: Vec::new(),
            rows: Vec::new(),
            generation: 0,
        };
        view.refilter();
        debug!(
            "Created view over {} records, {} columns, page size {}",
            view.records.len(),
            view.columns.len(),
            page_size
        );
        Ok(view)
    }

    // -------------------- Read access ---------------------- //

    pub fn view(&self) -> ViewResult<'_, R> {
        let PageState {
            page_index,
            page_size,
        } = self.state.page;
        let start = page_index.saturating_mul(page_size).min(self.rows.len());
        let end = start.saturating_add(page_size).min(self.rows.len());
        let row_indices = self.rows[start..end].to_vec();

        ViewResult {
            rows: row_indices.iter().map(|&idx| &self.records[idx]).collect(),
            row_indices,
            total_filtered: self.rows.len(),
            page_count: self.page_count(),
            page_index,
            page_size,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Incremented after every applied change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_filtered(&self) -> usize {
        self.rows.len()
    }

    /// Never below one: an empty result is still shown as one empty page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.state.page.page_size).max(1)
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.key() == key)
    }

    /// Sort indicator for a column header.
    pub fn sort_direction_for(&self, key: &str) -> Option<SortDirection> {
        match &self.state.sort.column {
            Some(column) if column == key => Some(self.state.sort.direction),
            _ => None,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // -------------------- State transitions ---------------------- //

    pub fn update(&mut self, message: Message) -> Result<(), ViewError> {
        trace!("Update: {message:?}");
        match message {
            Message::Search(text) => self.set_global_filter_text(text),
            Message::FilterColumn(key, value) => self.set_column_filter(&key, value)?,
            Message::ClearColumnFilter(key) => self.clear_column_filter(&key)?,
            Message::ClearFilters => self.clear_filters(),
            Message::Sort(key, direction) => self.set_sort(key.as_deref(), direction)?,
            Message::ToggleSort(key) => self.toggle_sort(&key)?,
            Message::PageSize(size) => self.set_page_size(size)?,
            Message::GoToPage(index) => self.go_to_page(index),
            Message::NextPage => self.next_page(),
            Message::PreviousPage => self.previous_page(),
            Message::FirstPage => self.first_page(),
            Message::LastPage => self.last_page(),
        }
        Ok(())
    }

    pub fn set_global_filter_text(&mut self, text: impl Into<String>) {
        self.state.filter.global_text = text.into();
        debug!("Global filter set to {:?}", self.state.filter.global_text);
        self.state.page.page_index = 0;
        self.refilter();
    }

    /// An empty `value` removes the constraint of that column.
    pub fn set_column_filter(&mut self, key: &str, value: impl Into<String>) -> Result<(), ViewError> {
        self.filterable_column(key)?;
        let value = value.into();
        debug!("Column filter {key:?} set to {value:?}");
        if value.is_empty() {
            self.state.filter.per_column.remove(key);
        } else {
            self.state.filter.per_column.insert(key.to_string(), value);
        }
        self.state.page.page_index = 0;
        self.refilter();
        Ok(())
    }

    pub fn clear_column_filter(&mut self, key: &str) -> Result<(), ViewError> {
        self.set_column_filter(key, String::new())
    }

    pub fn clear_filters(&mut self) {
        debug!("Clearing all filters");
        self.state.filter.global_text.clear();
        self.state.filter.per_column.clear();
        self.state.page.page_index = 0;
        self.refilter();
    }

    /// Reorders the filtered rows. The page index is kept since the row count does not change.
    pub fn set_sort(&mut self, key: Option<&str>, direction: SortDirection) -> Result<(), ViewError> {
        if let Some(key) = key {
            self.sortable_column(key)?;
        }
        self.state.sort = SortSpec {
            column: key.map(str::to_string),
            direction,
        };
        debug!("Sort set to {:?}", self.state.sort);
        self.resort();
        Ok(())
    }

    /// Header click cycling: unsorted, ascending, descending, unsorted.
    pub fn toggle_sort(&mut self, key: &str) -> Result<(), ViewError> {
        self.sortable_column(key)?;
        let (column, direction) = match self.sort_direction_for(key) {
            None => (Some(key), SortDirection::Ascending),
            Some(SortDirection::Ascending) => (Some(key), SortDirection::Descending),
            Some(SortDirection::Descending) => (None, SortDirection::Ascending),
        };
        self.set_sort(column, direction)
    }

    /// Keeps the previously first visible row on screen where possible.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        Self::validate_page_size(page_size)?;
        let PageState {
            page_index,
            page_size: old_size,
        } = self.state.page;
        let first_visible = page_index * old_size;
        self.state.page = PageState {
            page_index: first_visible / page_size,
            page_size,
        };
        debug!("Page size {old_size} -> {page_size}, first visible row {first_visible}");
        self.clamp_page();
        self.generation += 1;
        Ok(())
    }

    /// Out of range indices are clamped, never rejected.
    pub fn go_to_page(&mut self, index: i64) {
        let page_index = usize::try_from(index.max(0)).unwrap_or(usize::MAX);
        self.state.page.page_index = page_index;
        self.clamp_page();
        trace!("Go to page {index} => {}", self.state.page.page_index);
        self.generation += 1;
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.state.page.page_index as i64 + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.state.page.page_index as i64 - 1);
    }

    pub fn first_page(&mut self) {
        self.go_to_page(0);
    }

    pub fn last_page(&mut self) {
        self.go_to_page(self.page_count() as i64 - 1);
    }

    /// Swaps the whole source collection. Filters, sort and page position carry over.
    pub fn replace_records(&mut self, records: Vec<R>) {
        debug!("Replacing {} records with {}", self.records.len(), records.len());
        self.records = records;
        self.refilter();
    }

    // -------------------- Pipeline ---------------------- //

    fn refilter(&mut self) {
        self.filtered = self.filter_rows();
        self.resort();
    }

    fn resort(&mut self) {
        self.rows = self.sort_rows();
        self.clamp_page();
        self.generation += 1;
    }

    fn clamp_page(&mut self) {
        let last = self.page_count() - 1;
        if self.state.page.page_index > last {
            self.state.page.page_index = last;
        }
    }

    fn filter_rows(&self) -> Vec<usize> {
        let nrecords = self.records.len();
        if self.state.filter.is_empty() {
            return (0..nrecords).collect();
        }
        let start_time = Instant::now();

        let text = self.state.filter.global_text.as_str();
        let searchable: Vec<&Column<R>> = self.columns.iter().filter(|c| c.is_filterable()).collect();
        let constraints: Vec<(&Column<R>, &str)> = self
            .state
            .filter
            .per_column
            .iter()
            .filter_map(|(key, value)| self.column(key).map(|c| (c, value.as_str())))
            .collect();

        let records = &self.records;
        let keep = |idx: usize| {
            let record = &records[idx];
            (text.is_empty() || searchable.iter().any(|c| c.matches_text(record, text)))
                && constraints.iter().all(|(c, value)| c.matches_filter(record, value))
        };

        // Both paths keep source order, rayon's collect is order preserving.
        let rows: Vec<usize> = if nrecords >= self.config.parallel_threshold {
            (0..nrecords).into_par_iter().filter(|&idx| keep(idx)).collect()
        } else {
            (0..nrecords).filter(|&idx| keep(idx)).collect()
        };

        trace!(
            "Filter kept {} of {} rows in {}ms",
            rows.len(),
            nrecords,
            start_time.elapsed().as_millis()
        );
        rows
    }

    fn sort_rows(&self) -> Vec<usize> {
        let SortSpec { column, direction } = &self.state.sort;
        let Some(column) = column.as_deref().and_then(|key| self.column(key)) else {
            return self.filtered.clone();
        };
        let start_time = Instant::now();

        let mut keyed: Vec<(Value, usize)> = self
            .filtered
            .iter()
            .map(|&idx| (column.value(&self.records[idx]), idx))
            .collect();

        // Stable in both directions: equal keys keep their filtered order.
        let parallel = keyed.len() >= self.config.parallel_threshold;
        match (direction, parallel) {
            (SortDirection::Ascending, false) => keyed.sort_by(|(a, _), (b, _)| a.cmp(b)),
            (SortDirection::Descending, false) => keyed.sort_by(|(a, _), (b, _)| b.cmp(a)),
            (SortDirection::Ascending, true) => keyed.par_sort_by(|(a, _), (b, _)| a.cmp(b)),
            (SortDirection::Descending, true) => keyed.par_sort_by(|(a, _), (b, _)| b.cmp(a)),
        }

        trace!(
            "Sorted {} rows by {:?} {:?} in {}ms",
            keyed.len(),
            column.key(),
            direction,
            start_time.elapsed().as_millis()
        );
        keyed.into_iter().map(|(_, idx)| idx).collect()
    }

    // -------------------- Validation ---------------------- //

    fn validate_page_size(page_size: usize) -> Result<(), ViewError> {
        if page_size == 0 {
            return Err(ViewError::InvalidArgument("page size must be positive".into()));
        }
        Ok(())
    }

    fn existing_column(&self, key: &str) -> Result<&Column<R>, ViewError> {
        self.column(key)
            .ok_or_else(|| ViewError::InvalidColumn(format!("unknown column \"{key}\"")))
    }

    fn filterable_column(&self, key: &str) -> Result<&Column<R>, ViewError> {
        let column = self.existing_column(key)?;
        if !column.is_filterable() {
            return Err(ViewError::InvalidColumn(format!("column \"{key}\" is not filterable")));
        }
        Ok(column)
    }

    fn sortable_column(&self, key: &str) -> Result<&Column<R>, ViewError> {
        let column = self.existing_column(key)?;
        if !column.is_sortable() {
            return Err(ViewError::InvalidColumn(format!("column \"{key}\" is not sortable")));
        }
        Ok(column)
    }
}
