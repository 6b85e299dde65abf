//! Console Output
//!
//! Prints demo steps as plain-text tables, and the demo catalog for
//! `list`.

use std::io::{self, Write};

use crate::application::use_cases::{Demo, DemoStep};
use crate::domain::models::{Row, Value};

pub const NO_RESULTS: &str = "No results found";

/// Cells are cut to this many characters
const MAX_CELL_WIDTH: usize = 40;

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => "null".to_string(),
        other => other.to_string().replace('\n', " "),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        text
    }
}

/// Write `rows` as an aligned table with an index column
///
/// # Errors
///
/// Returns any error raised by the writer.
pub fn write_table<W: Write>(out: &mut W, rows: &[Row]) -> io::Result<()> {
    let Some(first) = rows.first() else {
        return writeln!(out, "{NO_RESULTS}");
    };

    let mut header = vec!["(index)".to_string()];
    header.extend(first.columns().iter().cloned());
    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            std::iter::once(idx.to_string())
                .chain(row.values().iter().map(cell))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &body {
        for (width, text) in widths.iter_mut().zip(line) {
            *width = (*width).max(text.chars().count());
        }
    }

    let separator = widths
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("┼");
    write_line(out, &header, &widths)?;
    writeln!(out, "{separator}")?;
    for line in &body {
        write_line(out, line, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(text, &width)| format!(" {text:<width$} "))
        .collect::<Vec<_>>()
        .join("│");
    writeln!(out, "{}", line.trim_end())
}

/// Write every step of a finished demo
///
/// # Errors
///
/// Returns any error raised by the writer.
pub fn write_steps<W: Write>(out: &mut W, demo: Demo, steps: &[DemoStep]) -> io::Result<()> {
    writeln!(out, "\n##### {demo}: {} #####", demo.description())?;
    for step in steps {
        writeln!(out, "\n=== {} ===", step.title)?;
        write_table(out, &step.rows)?;
        writeln!(out, "({} row{})", step.rows.len(), if step.rows.len() == 1 { "" } else { "s" })?;
    }
    Ok(())
}

/// Write the names and descriptions of every demo
///
/// # Errors
///
/// Returns any error raised by the writer.
pub fn write_catalog<W: Write>(out: &mut W) -> io::Result<()> {
    let width = Demo::ALL.iter().map(|d| d.name().len()).max().unwrap_or(0);
    for demo in Demo::ALL {
        writeln!(out, "{:<width$}  {}", demo.name(), demo.description())?;
    }
    Ok(())
}
