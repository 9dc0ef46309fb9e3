use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(value: &Value, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Table => render_table(value),
    }

    Ok(())
}

/// Minimal human-readable rendering: arrays of objects become aligned
/// columns, everything else falls back to indented key/value lines.
fn render_table(value: &Value) {
    match value {
        Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
            render_rows(rows);
        }
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
                        println!("{key}:");
                        render_rows(rows);
                    }
                    Value::Object(_) => {
                        println!("{key}:");
                        for line in flatten(value) {
                            println!("  {line}");
                        }
                    }
                    other => println!("{key}: {}", scalar(other)),
                }
            }
        }
        other => println!("{}", scalar(other)),
    }
}

fn render_rows(rows: &[Value]) {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut line = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let text = row
                .get(column)
                .map(scalar)
                .unwrap_or_default();
            widths[index] = widths[index].max(text.len());
            line.push(text);
        }
        cells.push(line);
    }

    let header = columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column:<width$}", width = widths[index]))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {header}");

    for line in cells {
        let rendered = line
            .iter()
            .enumerate()
            .map(|(index, text)| format!("{text:<width$}", width = widths[index]))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {rendered}");
    }
}

fn flatten(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}: {}", scalar(value)))
            .collect(),
        other => vec![scalar(other)],
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::from("-"),
        other => other.to_string(),
    }
}
