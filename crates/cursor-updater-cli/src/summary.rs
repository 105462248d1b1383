//! End-of-run summary output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cursor_updater::{ConflictReason, InstallMode, OperationTally, Outcome, RunReport};

/// Prints the outcome, any conflicts and warnings, and the operation table.
pub fn print_report(report: &RunReport, app_name: &str) {
    match &report.outcome {
        Outcome::UpToDate { version } => {
            println!("{app_name} is already up to date (version {version}).");
        }
        Outcome::Installed { version, path } => {
            println!("{app_name} {version} installed at {}.", path.display());
        }
        Outcome::Failed(error) => {
            eprintln!("error: {}", error.user_message());
            eprintln!("  {error}");
        }
    }

    if !report.conflicts.is_empty() {
        println!();
        println!("Potential installation conflicts:");
        for conflict in &report.conflicts {
            println!("  - {conflict}");
        }
        println!("  {}", conflict_advice(&report.conflicts));
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Completed with warnings:");
        for warning in &report.warnings {
            println!("  - {}: {warning}", warning.user_message());
        }
    }

    println!();
    print_tally(&report.tally, Some(&report.outcome));
}

/// Prints the operation table on its own, for runs that never started.
pub fn print_tally(tally: &OperationTally, outcome: Option<&Outcome>) {
    println!("{}", tally_table(tally, outcome));
}

/// Builds the operation summary table.
#[must_use]
pub fn tally_table(tally: &OperationTally, outcome: Option<&Outcome>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Summary"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let (label, color) = outcome_label(outcome);
    table.add_row(vec![
        Cell::new("Outcome"),
        Cell::new(label).fg(color).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Successful operations"),
        Cell::new(tally.succeeded),
    ]);
    table.add_row(vec![
        Cell::new("Failed operations"),
        count_cell(tally.failed, Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Success rate"),
        Cell::new(format_success_rate(tally.success_rate())),
    ]);
    table
}

/// Formats a success rate with one decimal, or `N/A` when nothing ran.
#[must_use]
pub fn format_success_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{rate:.1}%"),
        None => "N/A".to_string(),
    }
}

/// Hint printed after a user-local install.
#[must_use]
pub fn path_hint(mode: InstallMode, bin_dir: &std::path::Path) -> Option<String> {
    match mode {
        InstallMode::UserLocal => Some(format!(
            "Make sure {} is in your PATH to launch it from a terminal.",
            bin_dir.display()
        )),
        InstallMode::SystemWide => None,
    }
}

fn conflict_advice(conflicts: &[ConflictReason]) -> &'static str {
    if conflicts.contains(&ConflictReason::BothInstallsPresent) {
        "Remove one of the installations so the launcher and your PATH agree on which copy runs."
    } else {
        "Run consistently with or without sudo to keep a single installation."
    }
}

fn outcome_label(outcome: Option<&Outcome>) -> (&'static str, Color) {
    match outcome {
        Some(Outcome::UpToDate { .. }) => ("Up to date", Color::Green),
        Some(Outcome::Installed { .. }) => ("Installed", Color::Green),
        Some(Outcome::Failed(cursor_updater::UpdateError::Cancelled)) => {
            ("Cancelled", Color::Yellow)
        }
        Some(Outcome::Failed(_)) | None => ("Failed", Color::Red),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
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

fn count_cell(count: u32, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
