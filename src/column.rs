use std::fmt;
use std::sync::Arc;

use crate::value::Value;

type Accessor<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;
type Matcher<R> = Arc<dyn Fn(&R, &str) -> bool + Send + Sync>;

/// Describes how one column reads, orders and text-matches a record of type `R`.
///
/// ```
/// use tabview::{Column, Value};
///
/// struct Part { sku: String, price: f64 }
///
/// let price = Column::new("price", "Price", |p: &Part| Value::from(p.price)).filterable(false);
/// assert_eq!(price.key(), "price");
/// ```
pub struct Column<R> {
    key: String,
    label: String,
    accessor: Accessor<R>,
    filterable: bool,
    sortable: bool,
    matcher: Option<Matcher<R>>,
    predicate: Option<Matcher<R>>,
}

impl<R> Column<R> {
    pub fn new<F>(key: impl Into<String>, label: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            label: label.into(),
            accessor: Arc::new(accessor),
            filterable: true,
            sortable: true,
            matcher: None,
            predicate: None,
        }
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Replaces the default case-insensitive substring search of this column.
    pub fn with_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&R, &str) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Predicate used for per-column filters. Falls back to the text matcher.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R, &str) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn value(&self, record: &R) -> Value {
        (self.accessor)(record)
    }

    pub fn matches_text(&self, record: &R, text: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher(record, text),
            None => self.value(record).contains_ignore_case(text),
        }
    }

    pub fn matches_filter(&self, record: &R, filter: &str) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(record, filter),
            None => self.matches_text(record, filter),
        }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            accessor: Arc::clone(&self.accessor),
            filterable: self.filterable,
            sortable: self.sortable,
            matcher: self.matcher.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("filterable", &self.filterable)
            .field("sortable", &self.sortable)
            .field("custom_matcher", &self.matcher.is_some())
            .field("custom_predicate", &self.predicate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Part {
        name: &'static str,
        stock: i64,
    }

    fn part() -> Part {
        Part {
            name: "Hex Nut M8",
            stock: 120,
        }
    }

    #[test]
    fn default_matcher_is_case_insensitive_substring() {
        let col = Column::new("name", "Name", |p: &Part| Value::from(p.name));
        assert!(col.matches_text(&part(), "nut m"));
        assert!(!col.matches_text(&part(), "bolt"));
        // per-column filters fall back to the text matcher
        assert!(col.matches_filter(&part(), "HEX"));
    }

    #[test]
    fn custom_predicate_only_affects_column_filters() {
        let col = Column::new("stock", "Stock", |p: &Part| Value::from(p.stock)).with_predicate(
            |p: &Part, min: &str| min.parse::<i64>().map(|m| p.stock >= m).unwrap_or(false),
        );
        assert!(col.matches_filter(&part(), "100"));
        assert!(!col.matches_filter(&part(), "500"));
        assert!(col.matches_text(&part(), "12"));
    }

    #[test]
    fn custom_matcher_replaces_substring_search() {
        let col = Column::new("name", "Name", |p: &Part| Value::from(p.name))
            .with_matcher(|p: &Part, text: &str| p.name.starts_with(text));
        assert!(col.matches_text(&part(), "Hex"));
        assert!(!col.matches_text(&part(), "Nut"));
    }

    #[test]
    fn flags_default_to_enabled() {
        let col = Column::new("name", "Name", |p: &Part| Value::from(p.name));
        assert!(col.is_filterable());
        assert!(col.is_sortable());
        let col = col.filterable(false).sortable(false);
        assert!(!col.is_filterable());
        assert!(!col.is_sortable());
    }
}
