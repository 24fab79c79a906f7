use clap::Parser;
use tracing::trace;

use tabview::{DEFAULT_PAGE_SIZE, Message, SortDirection, TVError, TableView};

#[derive(Parser, Debug)]
#[command(name = "tabview", version, about = "Search, sort and page through a data file")]
pub struct Args {
    /// CSV, Parquet or Arrow IPC file
    pub path: String,

    /// Rows per page
    #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Page to show, starting at 1. Out of range pages are clamped
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub page: i64,

    /// Case-insensitive text searched in every column
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only keep rows whose COLUMN contains VALUE. Can be repeated
    #[arg(short, long = "filter", value_name = "COLUMN=VALUE")]
    pub filters: Vec<String>,

    /// Column to sort by
    #[arg(long, value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    #[arg(long, default_value_t = 30)]
    pub max_column_width: usize,

    /// Print every page instead of a single one
    #[arg(short, long)]
    pub all: bool,
}

/// Translates the command line into the messages driving the view.
pub struct Controller {
    messages: Vec<Message>,
}

impl Controller {
    pub fn new(args: &Args) -> Result<Self, TVError> {
        let mut messages = Vec::new();
        for raw in args.filters.iter() {
            messages.push(Self::parse_filter(raw)?);
        }
        if let Some(text) = &args.search {
            messages.push(Message::Search(text.clone()));
        }
        if let Some(column) = &args.sort {
            let direction = if args.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            messages.push(Message::Sort(Some(column.clone()), direction));
        }
        messages.push(Message::GoToPage(args.page.saturating_sub(1)));
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn apply<R: Sync>(&self, table: &mut TableView<R>) -> Result<(), TVError> {
        for message in self.messages.iter() {
            trace!("Applying {message:?}");
            table.update(message.clone())?;
        }
        Ok(())
    }

    fn parse_filter(raw: &str) -> Result<Message, TVError> {
        match raw.split_once('=') {
            Some((column, value)) if !column.trim().is_empty() => Ok(Message::FilterColumn(
                column.trim().to_string(),
                value.to_string(),
            )),
            _ => Err(TVError::InvalidArgument(format!(
                "filter \"{raw}\" is not of the form COLUMN=VALUE"
            ))),
        }
    }
}
