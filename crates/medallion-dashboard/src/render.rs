use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use polars::prelude::DataFrame;

use crate::reader::{DashboardView, Snapshot};

pub fn empty_message(prefix: &str) -> String {
    format!("No CSV files found in {prefix} yet. Trigger the pipeline and refresh.")
}

pub fn render(view: &DashboardView) -> String {
    match view {
        DashboardView::Empty { prefix } => empty_message(prefix),
        DashboardView::Ready { keys, snapshot } => render_snapshot(keys, snapshot),
    }
}

fn render_snapshot(keys: &[String], snapshot: &Snapshot) -> String {
    let mut out = String::from("Gold Outputs\n\nAvailable latest files:\n");
    for key in keys {
        let marker = if *key == snapshot.key { '*' } else { ' ' };
        out.push_str(&format!(" {marker} {key}\n"));
    }
    out.push_str(&format!(
        "\nRows: {}  Columns: {}  S3 key: {}\n",
        snapshot.rows(),
        snapshot.columns(),
        snapshot.key
    ));
    out.push_str(&frame_table(&snapshot.frame).to_string());
    out.push('\n');
    out
}

fn frame_table(frame: &DataFrame) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            frame
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>(),
        );

    let columns = frame.get_columns();
    for row in 0..frame.height() {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| match column.get(row) {
                Ok(value) if value.is_null() => String::new(),
                Ok(value) => value.str_value().to_string(),
                Err(_) => String::new(),
            })
            .collect();
        table.add_row(cells);
    }
    table
}
