// src/export/mod.rs
use crate::report::Row;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// UTF-8 byte-order mark, so spreadsheet applications detect the encoding.
pub const BOM: char = '\u{FEFF}';

/// The reports that can be exported, each with its own file stem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dataset {
    Full,
    Countries,
    GlobalStats,
}

impl Dataset {
    pub fn stem(&self) -> &'static str {
        match self {
            Dataset::Full => "covid19-data",
            Dataset::Countries => "covid19-countries",
            Dataset::GlobalStats => "covid19-global-stats",
        }
    }
}

/// `<dataset>-<YYYY-MM-DD>.csv`
pub fn export_filename(dataset: Dataset, date: NaiveDate) -> String {
    format!("{}-{}.csv", dataset.stem(), date.format("%Y-%m-%d"))
}

/// [`export_filename`] for the current UTC date.
pub fn filename_for_today(dataset: Dataset) -> String {
    export_filename(dataset, Utc::now().date_naive())
}

/// Quote a field when it contains a comma, a quote or a line break; inner quotes are doubled.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Rows joined by `\n`, cells by `,`. No trailing newline.
pub fn to_csv(rows: &[Row]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| escape_field(&cell.to_string()).into_owned())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn with_bom(csv: &str) -> String {
    let mut out = String::with_capacity(csv.len() + BOM.len_utf8());
    out.push(BOM);
    out.push_str(csv);
    out
}

/// Where finished exports go.
pub trait Sink {
    /// Store `csv` under `filename`, returning where it ended up.
    fn save(&self, filename: &str, csv: &str) -> Result<PathBuf>;
}

/// Writes BOM-prefixed files into a local directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates `dir` if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating export directory {:?}", &dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Sink for DirectorySink {
    fn save(&self, filename: &str, csv: &str) -> Result<PathBuf> {
        let path = self.dir.join(filename);
        fs::write(&path, with_bom(csv)).with_context(|| format!("writing {:?}", &path))?;
        info!(path = %path.display(), bytes = csv.len(), "saved export");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{parse_with, QuoteMode, Table};
    use crate::report::Cell;
    use tempfile::tempdir;

    fn text_rows(rows: &[&[&str]]) -> Vec<Row> {
        rows.iter()
            .map(|r| r.iter().map(|&c| Cell::from(c)).collect())
            .collect()
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert!(matches!(escape_field("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_to_csv_mixed_cells() {
        let rows = vec![
            vec![Cell::from("Country"), Cell::from("Total")],
            vec![Cell::from("Korea, South"), Cell::Int(42)],
        ];
        assert_eq!(to_csv(&rows), "Country,Total\n\"Korea, South\",42");
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_round_trip_through_parser() {
        let rows = text_rows(&[
            &["Province/State", "Country/Region", "1/22/20"],
            &["", "Korea, South", "1"],
            &["Bonaire, Sint Eustatius and Saba", "Netherlands", "0"],
        ]);
        let table = parse_with(&to_csv(&rows), QuoteMode::Toggle);
        assert_eq!(table.headers, vec!["Province/State", "Country/Region", "1/22/20"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(Table::field(&table.rows[0], "Country/Region"), "Korea, South");
        assert_eq!(
            Table::field(&table.rows[1], "Province/State"),
            "Bonaire, Sint Eustatius and Saba"
        );
    }

    #[test]
    fn test_round_trip_embedded_quotes_needs_strict_mode() {
        let rows = text_rows(&[&["name", "note"], &["x", "say \"hi\", ok"]]);
        let csv = to_csv(&rows);

        let strict = parse_with(&csv, QuoteMode::Strict);
        assert_eq!(Table::field(&strict.rows[0], "note"), "say \"hi\", ok");

        let toggle = parse_with(&csv, QuoteMode::Toggle);
        assert_eq!(Table::field(&toggle.rows[0], "note"), "say hi, ok");
    }

    #[test]
    fn test_line_breaks_in_cells_do_not_survive_parsing() {
        let rows = text_rows(&[&["name", "note"], &["x", "two\nlines"]]);
        let csv = to_csv(&rows);
        assert!(csv.contains("\"two\nlines\""));

        // lines are split before quotes are looked at, in both modes
        for mode in [QuoteMode::Toggle, QuoteMode::Strict] {
            let table = parse_with(&csv, mode);
            assert_eq!(table.rows.len(), 1);
            assert_eq!(Table::field(&table.rows[0], "note"), "two");
        }
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 9).unwrap();
        assert_eq!(
            export_filename(Dataset::Full, date),
            "covid19-data-2023-03-09.csv"
        );
        assert_eq!(
            export_filename(Dataset::GlobalStats, date),
            "covid19-global-stats-2023-03-09.csv"
        );
        assert!(filename_for_today(Dataset::Countries).starts_with("covid19-countries-"));
    }

    #[test]
    fn test_directory_sink_writes_bom() -> Result<()> {
        let tmp = tempdir()?;
        let sink = DirectorySink::new(tmp.path().join("out"))?;
        let path = sink.save("report.csv", "a,b\n1,2")?;

        assert_eq!(path, sink.dir().join("report.csv"));
        let written = fs::read_to_string(&path)?;
        assert!(written.starts_with(BOM));
        assert_eq!(written.trim_start_matches(BOM), "a,b\n1,2");
        Ok(())
    }
}
