// src/process/mod.rs
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub mod series;

/// One parsed data line, keyed by (trimmed) header name.
pub type Record = HashMap<String, String>;

/// How `"` characters are interpreted while splitting a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteMode {
    /// Every `"` flips the inside-quotes flag and is dropped. `""` is not an escape.
    #[default]
    Toggle,
    /// Like `Toggle`, but `""` inside a quoted field yields one literal `"`.
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names from the first non-blank line, in file order.
    pub headers: Vec<String>,
    /// Every data line that carried at least `headers.len()` fields.
    pub rows: Vec<Record>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in `row`, or `""` when the column is unknown.
    pub fn field<'a>(row: &'a Record, column: &str) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Parse CSV text using the default (`Toggle`) quote handling.
pub fn parse(text: &str) -> Table {
    parse_with(text, QuoteMode::Toggle)
}

/// Parse CSV text into a [`Table`].
///
/// - blank / whitespace-only lines are skipped
/// - the first remaining line is the header
/// - lines with fewer fields than the header are dropped, extra fields ignored
/// - every header and value is trimmed
///
/// Never fails: empty input yields an empty table.
#[tracing::instrument(level = "debug", skip(text), fields(bytes = text.len()))]
pub fn parse_with(text: &str, mode: QuoteMode) -> Table {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Table::default();
    };
    let headers: Vec<String> = split_line(header_line, mode)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for line in lines {
        let fields = split_line(line, mode);
        if fields.len() < headers.len() {
            dropped += 1;
            continue;
        }
        let row: Record = headers
            .iter()
            .zip(fields)
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();
        rows.push(row);
    }

    if dropped > 0 {
        debug!(dropped, "skipped short rows");
    }
    debug!(columns = headers.len(), rows = rows.len(), "parsed table");
    Table { headers, rows }
}

/// Split a single line on commas that are not inside quotes.
/// Quote characters are never part of the returned values.
pub fn split_line(line: &str, mode: QuoteMode) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if mode == QuoteMode::Strict && in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
