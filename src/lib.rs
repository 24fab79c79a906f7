//! In-memory tabular view engine.
//!
//! A [`TableView`] owns a record collection plus the column definitions describing it and
//! derives the visible page from three inputs: global search text, per-column filters and a
//! sort specification. Any change re-derives the page so the three stay consistent.
//!
//! ```
//! use tabview::{Column, SortDirection, TableView, Value};
//!
//! struct Part { name: &'static str, category: &'static str }
//!
//! let parts = vec![
//!     Part { name: "Hex Bolt", category: "B" },
//!     Part { name: "Washer", category: "A" },
//!     Part { name: "Carriage Bolt", category: "B" },
//! ];
//! let columns = vec![
//!     Column::new("name", "Name", |p: &Part| Value::from(p.name)),
//!     Column::new("category", "Category", |p: &Part| Value::from(p.category)),
//! ];
//!
//! let mut table = TableView::new(parts, columns, 2).unwrap();
//! table.set_global_filter_text("bolt");
//! table.set_sort(Some("name"), SortDirection::Ascending).unwrap();
//!
//! let view = table.view();
//! assert_eq!(view.total_filtered, 2);
//! assert_eq!(view.rows[0].name, "Carriage Bolt");
//! ```

pub mod column;
pub mod domain;
pub mod model;
pub mod value;

pub use column::Column;
pub use domain::{
    EngineConfig, FilterState, Message, PageState, SortDirection, SortSpec, TVError, ViewError,
    ViewState, DEFAULT_PAGE_SIZE,
};
pub use model::{TableView, ViewResult};
pub use value::Value;
