//! Option file loaders
//!
//! Reads `OptionItem`s from CSV or JSON files. The format is picked by file
//! extension: `.json` is JSON, everything else is treated as CSV.
//!
//! CSV layouts:
//! - `label,value`
//! - `value,label,...` or `code,label,value` (three or more columns)
//! - `label` alone, values assigned from the running count
//!
//! JSON layouts:
//! - `[{"label": "USA", "value": 1}, ...]`
//! - `{"USA": 1, "Canada": 2}`

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::api::OptionItem;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Load options from `path`, choosing the parser by extension
pub fn load_options(path: &Path) -> Result<Vec<OptionItem>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read option file: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let items = if is_json {
        parse_json_options(&content)
    } else {
        parse_csv_options(&content)
    }
    .with_context(|| format!("Failed to parse option file: {}", path.display()))?;

    debug!("Loaded {} option(s) from {:?}", items.len(), path);
    Ok(items)
}

/// Parse CSV content with delimiter sniffing and header detection
pub fn parse_csv_options(content: &str) -> Result<Vec<OptionItem>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let delimiter = sniff_delimiter(content);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (line_num, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Line {}: malformed CSV", line_num + 1))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(row);
    }

    let skip = usize::from(has_header(&rows));
    if skip == 1 {
        debug!("Skipping CSV header row: {:?}", rows[0]);
    }

    let mut items: Vec<OptionItem> = Vec::new();
    for row in rows.iter().skip(skip) {
        match row_to_item(row, items.len()) {
            Some(item) => items.push(item),
            None => warn!("Skipping CSV row without an integer value: {:?}", row),
        }
    }
    Ok(items)
}

/// Parse a JSON array of `{label, value}` objects or a `{label: value}` map
pub fn parse_json_options(content: &str) -> Result<Vec<OptionItem>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let data: Value = serde_json::from_str(content).context("Invalid JSON")?;

    match data {
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| -> Result<OptionItem> {
                let label = entry
                    .get("label")
                    .and_then(Value::as_str)
                    .with_context(|| format!("Entry {}: missing string \"label\"", i))?;
                let value = entry
                    .get("value")
                    .and_then(json_int)
                    .with_context(|| format!("Entry {}: missing integer \"value\"", i))?;
                Ok(OptionItem::new(label, value))
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(label, value)| -> Result<OptionItem> {
                let value = json_int(value)
                    .with_context(|| format!("Value for \"{}\" is not an integer", label))?;
                Ok(OptionItem::new(label.as_str(), value))
            })
            .collect(),
        _ => anyhow::bail!("Expected a JSON array or object"),
    }
}

fn json_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => parse_int(s),
        _ => None,
    }
}

fn parse_int(cell: &str) -> Option<i32> {
    cell.trim().parse().ok()
}

/// Most frequent candidate delimiter on the first non-empty line; `,` when none appear
fn sniff_delimiter(content: &str) -> u8 {
    let Some(first_line) = content.lines().find(|line| !line.trim().is_empty()) else {
        return b',';
    };

    DELIMITERS
        .iter()
        .map(|&d| (d, first_line.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, count)| count > 0)
        .max_by_key(|&(_, count)| count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn has_header(rows: &[Vec<String>]) -> bool {
    let Some(first) = rows.first() else {
        return false;
    };

    if first.len() == 1 {
        let cell = first[0].to_lowercase();
        if cell == "label" || cell == "name" {
            return true;
        }
    }

    let first_numeric = first.iter().any(|cell| parse_int(cell).is_some());
    let second_numeric = rows
        .get(1)
        .is_some_and(|row| row.iter().any(|cell| parse_int(cell).is_some()));

    !first_numeric && second_numeric
}

fn row_to_item(row: &[String], loaded: usize) -> Option<OptionItem> {
    match row.len() {
        0 => None,
        1 => Some(OptionItem::new(row[0].as_str(), i32::try_from(loaded).ok()?)),
        2 => Some(OptionItem::new(row[0].as_str(), parse_int(&row[1])?)),
        _ => {
            let value = parse_int(&row[0]).or_else(|| parse_int(&row[2]))?;
            Some(OptionItem::new(row[1].as_str(), value))
        }
    }
}
