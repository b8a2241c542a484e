use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use recon_cli::report::TaskRun;

use crate::commands::TaskCheck;

pub fn print_summary(runs: &[TaskRun]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Task"),
        header_cell("Rows in"),
        header_cell("Rows out"),
        header_cell("Steps"),
        header_cell("Changed"),
        header_cell("Misses"),
        header_cell("Output"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 7, CellAlignment::Center);

    for run in runs {
        let name = task_cell(&run.label());
        match &run.result {
            Ok(outcome) => {
                let misses: usize = outcome.steps.iter().map(|step| step.misses).sum();
                table.add_row(vec![
                    name,
                    Cell::new(outcome.rows_in),
                    Cell::new(outcome.rows_out),
                    Cell::new(outcome.steps.len()),
                    count_cell(outcome.rows_changed(), Color::Green),
                    count_cell(misses, Color::Yellow),
                    output_cell(outcome.output.as_deref()),
                    Cell::new("ok").fg(Color::Green),
                ]);
            }
            Err(error) => {
                table.add_row(vec![
                    name,
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    Cell::new(error.kind())
                        .fg(Color::Red)
                        .add_attribute(Attribute::Bold),
                ]);
            }
        }
    }
    println!("{table}");

    let failures: Vec<&TaskRun> = runs.iter().filter(|run| run.failed()).collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for run in failures {
            if let Err(error) = &run.result {
                eprintln!("- {}: {error}", run.label());
            }
        }
    }
}

pub fn print_checks(checks: &[TaskCheck]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Task file"),
        header_cell("Task"),
        header_cell("Inputs"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for check in checks {
        let status = match &check.result {
            Ok(()) => Cell::new("ok").fg(Color::Green),
            Err(error) => Cell::new(error.kind())
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
        };
        table.add_row(vec![
            Cell::new(check.task_file.display()),
            check
                .name
                .as_deref()
                .map_or_else(|| dim_cell("-"), task_cell),
            Cell::new(check.inputs),
            status,
        ]);
    }
    println!("{table}");
    for check in checks {
        if let Err(error) = &check.result {
            eprintln!("- {}: {error}", check.task_file.display());
        }
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn task_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn output_cell(path: Option<&Path>) -> Cell {
    match path {
        Some(path) => Cell::new(path.display()),
        None => dim_cell("dry run"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
