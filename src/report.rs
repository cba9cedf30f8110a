//! CSV summary report for a finished batch.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::runner::ExecutionResult;

const HEADER: [&str; 5] = ["folder", "inventory", "playbook", "status", "duration_s"];

/// Write the whole batch as one CSV table, one row per task in
/// execution order, durations to one decimal place.
pub fn write_summary(path: &Path, results: &[ExecutionResult]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary {}", path.display()))?;
    let mut out = BufWriter::new(file);

    write_row(&mut out, &HEADER.map(str::to_string))
        .with_context(|| format!("Failed to write summary {}", path.display()))?;
    for result in results {
        let row = [
            result.task.folder_name(),
            result.task.inventory_name(),
            result.task.playbook_name(),
            result.status.to_string(),
            format!("{:.1}", result.seconds()),
        ];
        write_row(&mut out, &row)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
    }

    out.flush()
        .with_context(|| format!("Failed to write summary {}", path.display()))?;
    Ok(())
}

fn write_row<W: Write>(out: &mut W, fields: &[String; 5]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")
}

/// Quote a field only when the CSV dialect requires it.
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
