use tabview::{SortDirection, TableView, ViewResult};

pub const COLUMN_WIDTH_MARGIN: usize = 2;
const SORT_ASCENDING: &str = "▲";
const SORT_DESCENDING: &str = "▼";

#[derive(Clone, Debug)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

/// Renders the current page of a view as plain text.
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(max_column_width: usize) -> Self {
        Self { max_column_width }
    }

    pub fn render<R: Sync>(&self, name: &str, table: &TableView<R>) -> String {
        let view = table.view();

        let mut columns = vec![self.index_column(&view)];
        for column in table.columns() {
            let header = match table.sort_direction_for(column.key()) {
                Some(SortDirection::Ascending) => format!("{} {SORT_ASCENDING}", column.label()),
                Some(SortDirection::Descending) => format!("{} {SORT_DESCENDING}", column.label()),
                None => column.label().to_string(),
            };
            let data = view
                .rows
                .iter()
                .map(|record| column.value(record).to_string())
                .collect();
            columns.push(self.column_view(header, data));
        }

        let mut lines = Vec::with_capacity(view.rows.len() + 4);
        lines.push(format!("[{name}]"));
        lines.push(Self::render_line(&columns, |c| c.name.as_str()));
        lines.push(
            columns
                .iter()
                .map(|c| "─".repeat(c.width - COLUMN_WIDTH_MARGIN))
                .collect::<Vec<_>>()
                .join(&" ".repeat(COLUMN_WIDTH_MARGIN)),
        );
        if view.is_empty() {
            lines.push("(no matching rows)".to_string());
        }
        for row in 0..view.rows.len() {
            lines.push(Self::render_line(&columns, |c| c.data[row].as_str()));
        }
        lines.push(format!(
            "Page {}/{} · {} matching of {} rows",
            view.page_index + 1,
            view.page_count,
            view.total_filtered,
            table.len()
        ));
        lines.join("\n")
    }

    // Row numbers refer to the position in the loaded file.
    fn index_column<R>(&self, view: &ViewResult<'_, R>) -> ColumnView {
        let data = view.row_indices.iter().map(|idx| (idx + 1).to_string()).collect();
        self.column_view("#".to_string(), data)
    }

    fn column_view(&self, name: String, data: Vec<String>) -> ColumnView {
        let widest = data.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let width = std::cmp::max(name.chars().count(), widest) + COLUMN_WIDTH_MARGIN;
        let width = std::cmp::min(width, self.max_column_width.max(COLUMN_WIDTH_MARGIN + 1));
        ColumnView { name, width, data }
    }

    fn render_line<'c>(columns: &'c [ColumnView], cell: impl Fn(&'c ColumnView) -> &'c str) -> String {
        let line = columns
            .iter()
            .map(|c| {
                let text = Self::get_visible_name(cell(c), c.width - COLUMN_WIDTH_MARGIN);
                format!("{:<width$}", text, width = c.width)
            })
            .collect::<String>();
        line.trim_end().to_string()
    }

    fn get_visible_name(name: &str, width: usize) -> String {
        if name.chars().count() <= width {
            return name.to_string();
        }
        if width < 3 {
            return "".to_string();
        }
        let mut reduced_name: String = name.chars().take(width - 3).collect();
        reduced_name.push_str("...");
        reduced_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabview::{Column, Value};

    struct Part {
        name: &'static str,
        price: f64,
    }

    fn table() -> TableView<Part> {
        let parts = vec![
            Part { name: "Hex Bolt", price: 0.2 },
            Part { name: "Threaded Rod M8 x 1000mm", price: 3.5 },
            Part { name: "Washer", price: 0.05 },
        ];
        let columns = vec![
            Column::new("name", "Name", |p: &Part| Value::from(p.name)),
            Column::new("price", "Price", |p: &Part| Value::from(p.price)),
        ];
        TableView::new(parts, columns, 2).unwrap()
    }

    #[test]
    fn renders_header_rows_and_footer() {
        let mut table = table();
        table.set_sort(Some("price"), SortDirection::Descending).unwrap();
        let out = TableUI::new(12).render("parts.csv", &table);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "[parts.csv]");
        assert!(lines[1].starts_with("#  Name"));
        assert!(lines[1].ends_with("Price ▼"));
        assert!(lines[3].starts_with("2  Threade..."));
        assert!(lines[4].starts_with("1  Hex Bolt"));
        assert_eq!(lines[5], "Page 1/2 · 3 matching of 3 rows");
    }

    #[test]
    fn renders_empty_page() {
        let mut table = table();
        table.set_global_filter_text("no such part");
        let out = TableUI::new(30).render("parts.csv", &table);
        assert!(out.contains("(no matching rows)"));
        assert!(out.ends_with("Page 1/1 · 0 matching of 3 rows"));
    }

    #[test]
    fn visible_name_is_cut_with_ellipsis() {
        assert_eq!(TableUI::get_visible_name("Washer", 10), "Washer");
        assert_eq!(TableUI::get_visible_name("Carriage Bolt", 8), "Carri...");
        assert_eq!(TableUI::get_visible_name("Carriage Bolt", 2), "");
        assert_eq!(TableUI::get_visible_name("Ø-Ring Größe", 7), "Ø-Ri...");
    }
}
