use std::collections::BTreeMap;
use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;

/// Page size used when a caller does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Errors reported by the view engine. A rejected operation leaves the engine untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The column key is unknown, duplicated, or does not support the requested operation.
    InvalidColumn(String),
    InvalidArgument(String),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::InvalidColumn(msg) => write!(f, "invalid column: {msg}"),
            ViewError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for ViewError {}

// Errors of the command line browser, which also has to load files.
#[derive(Debug)]
pub enum TVError {
    IoError(Error),
    PolarsError(PolarsError),
    View(ViewError),
    LoadingFailed(String),
    InvalidArgument(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for TVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TVError::IoError(e) => write!(f, "{e}"),
            TVError::PolarsError(e) => write!(f, "{e}"),
            TVError::View(e) => write!(f, "{e}"),
            TVError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TVError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            TVError::FileNotFound => write!(f, "file not found"),
            TVError::PermissionDenied => write!(f, "permission denied"),
            TVError::UnknownFileType => write!(f, "unknown file type"),
        }
    }
}

impl std::error::Error for TVError {}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        TVError::IoError(err)
    }
}

impl From<PolarsError> for TVError {
    fn from(err: PolarsError) -> Self {
        TVError::PolarsError(err)
    }
}

impl From<ViewError> for TVError {
    fn from(err: ViewError) -> Self {
        TVError::View(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// `column == None` keeps the natural order of the record set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub column: Option<String>,
    pub direction: SortDirection,
}

/// Empty text and absent entries mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub global_text: String,
    pub per_column: BTreeMap<String, String>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.global_text.is_empty() && self.per_column.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Snapshot of every input the engine derives its view from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub filter: FilterState,
    pub sort: SortSpec,
    pub page: PageState,
}

/// One message per mutating engine operation, see `TableView::update`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Search(String),
    FilterColumn(String, String),
    ClearColumnFilter(String),
    ClearFilters,
    Sort(Option<String>, SortDirection),
    ToggleSort(String),
    PageSize(usize),
    GoToPage(i64),
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct EngineConfig {
    /// Record count at which filtering moves onto the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 50_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_defaults() {
        let state = ViewState::default();
        assert!(state.filter.is_empty());
        assert_eq!(state.sort.column, None);
        assert_eq!(state.sort.direction, SortDirection::Ascending);
        assert_eq!(state.page.page_index, 0);
        assert_eq!(state.page.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn config_setters() {
        let cfg = EngineConfig::default().with_parallel_threshold(10);
        assert_eq!(cfg.parallel_threshold, 10);
    }

    #[test]
    fn view_error_converts_into_tv_error() {
        let err: TVError = ViewError::InvalidColumn("nope".into()).into();
        assert_eq!(err.to_string(), "invalid column: nope");
    }
}
