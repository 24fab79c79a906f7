use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod table;
mod ui;

use controller::{Args, Controller};
use table::Table;
use tabview::{TVError, TableView};
use ui::TableUI;

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

// Logs go to stderr so they never mix with the rendered table. Set TABVIEW_LOG=trace for timings.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TABVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();
}

fn run(args: Args) -> Result<(), TVError> {
    let path = shellexpand::full(&args.path)
        .map_err(|e| TVError::InvalidArgument(e.to_string()))?;
    let table = Table::load(PathBuf::from(path.into_owned()))?;

    let columns = table.columns();
    let mut view = TableView::new(table.rows, columns, args.page_size)?;
    let controller = Controller::new(&args)?;
    debug!("Messages from arguments: {:?}", controller.messages());
    controller.apply(&mut view)?;
    debug!("View state after arguments: {:?}", view.state());

    let ui = TableUI::new(args.max_column_width);
    if !args.all {
        println!("{}", ui.render(&table.name, &view));
        return Ok(());
    }

    view.first_page();
    loop {
        println!("{}", ui.render(&table.name, &view));
        if view.state().page.page_index + 1 >= view.page_count() {
            break;
        }
        view.next_page();
        println!();
    }
    Ok(())
}
