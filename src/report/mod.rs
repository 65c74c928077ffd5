// src/report/mod.rs
//! Tabular reports built from the parsed tables, ready for `export::to_csv`.

use crate::metrics::{
    average, classify_trend, daily_deltas, latest_delta, round_half_up, tail, trend, Trend,
    FORTNIGHT, WEEK,
};
use crate::process::series::{date_columns, series_for_exact};
use crate::process::Table;
use std::fmt;

pub mod summary;

pub use summary::{summarize, GlobalSummary, RECOVERY_RATIO};

/// Number of trailing date columns carried by the full export.
pub const EXPORT_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

pub type Row = Vec<Cell>;

/// `part / whole * 100` with two decimals, `"0.00"` when `whole` is 0.
/// Ties round up (`0.125` → `"0.13"`).
pub fn format_rate(part: i64, whole: i64) -> String {
    if whole <= 0 {
        return "0.00".to_string();
    }
    let hundredths = round_half_up(part as f64 / whole as f64 * 100.0 * 100.0);
    let sign = if hundredths < 0 { "-" } else { "" };
    let abs = hundredths.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Per-country confirmed / deaths / daily-new-cases rows over the last 30 dates.
///
/// Empty when the confirmed table has no columns or nothing is selected.
/// A header-only table still yields the header plus all-zero rows.
pub fn full_export(confirmed: &Table, deaths: Option<&Table>, countries: &[String]) -> Vec<Row> {
    if confirmed.headers.is_empty() || countries.is_empty() {
        return Vec::new();
    }
    let dates = date_columns(confirmed);

    let mut header: Row = vec!["Country".into(), "Type".into()];
    header.extend(tail(dates, EXPORT_DAYS).iter().map(|d| Cell::from(d.as_str())));
    header.extend(["Current_Total", "Average_7d", "Trend"].map(Cell::from));

    let mut rows = vec![header];
    for country in countries {
        let confirmed_values = series_for_exact(confirmed, country, dates);
        let daily = daily_deltas(&confirmed_values);
        let (avg, direction) = weekly_stats(&daily);
        rows.push(series_row(country, "Confirmed", &confirmed_values, avg, direction));

        if let Some(deaths) = deaths.filter(|_| !dates.is_empty()) {
            let death_values = series_for_exact(deaths, country, dates);
            let (death_avg, death_direction) = weekly_stats(&daily_deltas(&death_values));
            rows.push(series_row(
                country,
                "Deaths",
                &death_values,
                death_avg,
                death_direction,
            ));
        }

        rows.push(series_row(country, "Daily_New_Cases", &daily, avg, direction));
    }
    rows
}

/// One line per country with totals, yesterday's increase and mortality rate.
pub fn country_summary(confirmed: &Table, deaths: Option<&Table>, countries: &[String]) -> Vec<Row> {
    let dates = date_columns(confirmed);
    let mut rows: Vec<Row> = vec![[
        "Country",
        "Total_Confirmed",
        "Total_Deaths",
        "New_Cases_Yesterday",
        "New_Deaths_Yesterday",
        "Mortality_Rate_%",
        "Last_Update",
    ]
    .map(Cell::from)
    .to_vec()];

    for country in countries {
        let confirmed_values = series_for_exact(confirmed, country, dates);
        let death_values = deaths
            .map(|d| series_for_exact(d, country, dates))
            .unwrap_or_default();

        let total_confirmed = confirmed_values.last().copied().unwrap_or(0);
        let total_deaths = death_values.last().copied().unwrap_or(0);

        rows.push(vec![
            country.as_str().into(),
            total_confirmed.into(),
            total_deaths.into(),
            latest_delta(&confirmed_values).into(),
            latest_delta(&death_values).into(),
            format_rate(total_deaths, total_confirmed).into(),
            dates.last().map(String::as_str).unwrap_or("").into(),
        ]);
    }
    rows
}

/// Fixed worldwide table. Recovered/active figures are always tagged as estimates.
pub fn global_stats(summary: &GlobalSummary) -> Vec<Row> {
    let row = |label: &str, value: Cell, kind: &str| -> Row { vec![label.into(), value, kind.into()] };
    vec![
        row("Statistic", "Value".into(), "Type"),
        row("Total confirmed cases", summary.confirmed.into(), "Official"),
        row("Total deaths", summary.deaths.into(), "Official"),
        row("Estimated recoveries", summary.recovered.into(), "Estimated"),
        row("Estimated active cases", summary.active.into(), "Estimated"),
        row(
            "Mortality rate (%)",
            format_rate(summary.deaths, summary.confirmed).into(),
            "Calculated",
        ),
        row(
            "Recovery rate (%)",
            format_rate(summary.recovered, summary.confirmed).into(),
            "Estimated",
        ),
        row("Last update", summary.last_update.as_str().into(), "Date"),
    ]
}

fn weekly_stats(daily: &[i64]) -> (i64, Trend) {
    (
        average(tail(daily, WEEK)),
        classify_trend(trend(tail(daily, FORTNIGHT))),
    )
}

fn series_row(country: &str, kind: &str, values: &[i64], avg: i64, direction: Trend) -> Row {
    let mut row: Row = vec![country.into(), kind.into()];
    row.extend(tail(values, EXPORT_DAYS).iter().map(|&v| Cell::Int(v)));
    row.push(values.last().copied().unwrap_or(0).into());
    row.push(avg.into());
    row.push(direction.as_str().into());
    row
}
