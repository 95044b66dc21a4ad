use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::table::Page;

const MAX_COLUMNS: usize = 6;
const MAX_CELL: usize = 32;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a key/value listing in the appropriate format
pub fn output_fields(output_format: OutputFormat, data: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => {
            if let Some(map) = data.as_object() {
                let width = map.keys().map(String::len).max().unwrap_or(0);
                for (key, value) in map {
                    println!("{:width$}  {}", key, cell(value), width = width);
                }
            }
        }
    }
    Ok(())
}

/// Output one table page in the appropriate format
pub fn output_page(output_format: OutputFormat, resource: &str, page: &Page) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(page)?),
        OutputFormat::Text => {
            if page.rows.is_empty() {
                println!("No {} found", resource);
                return Ok(());
            }
            print!("{}", render_rows(&page.rows));
            println!(
                "Page {} of {} ({} rows)",
                page.page, page.total_pages, page.total_rows
            );
        }
    }
    Ok(())
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_CELL {
        let cut: String = text.chars().take(MAX_CELL - 1).collect();
        format!("{}…", cut)
    } else {
        text
    }
}

/// Columns come from the first row's keys, capped at a readable count.
pub fn render_rows(rows: &[Value]) -> String {
    let columns: Vec<&str> = rows
        .first()
        .and_then(Value::as_object)
        .map(|map| map.keys().map(String::as_str).take(MAX_COLUMNS).collect())
        .unwrap_or_default();

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.get(*c).map(cell).unwrap_or_default()).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:w$}", v, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(columns.clone()));
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_render_aligned() {
        let rendered = render_rows(&[
            json!({ "id": 1, "name": "Admin" }),
            json!({ "id": 22, "name": null }),
        ]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "id  name");
        assert_eq!(lines[1], "1   Admin");
        assert_eq!(lines[2], "22");
    }

    #[test]
    fn long_cells_are_cut() {
        let long = "x".repeat(40);
        assert_eq!(cell(&json!(long)).chars().count(), MAX_CELL);
    }
}
