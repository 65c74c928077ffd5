use crate::metrics::round_half_up;
use crate::process::{series::parse_int, Table};

/// Share of closed (non-fatal) cases assumed recovered. Heuristic, not sourced data.
pub const RECOVERY_RATIO: f64 = 0.975;

/// Worldwide totals at the most recent date.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSummary {
    pub confirmed: i64,
    pub deaths: i64,
    /// Estimated, see [`GlobalSummary::estimate`].
    pub recovered: i64,
    /// Estimated, derived from `recovered`.
    pub active: i64,
    pub last_update: String,
    pub recovered_estimated: bool,
}

impl GlobalSummary {
    /// Fill in the recovered/active estimates from the official totals.
    pub fn estimate(confirmed: i64, deaths: i64, last_update: impl Into<String>, ratio: f64) -> Self {
        let recovered = round_half_up((confirmed - deaths) as f64 * ratio);
        Self {
            confirmed,
            deaths,
            recovered,
            active: confirmed - deaths - recovered,
            last_update: last_update.into(),
            recovered_estimated: true,
        }
    }
}

/// Sum both tables at the confirmed table's last column.
/// `None` when either table has no headers.
pub fn summarize(confirmed: &Table, deaths: &Table, ratio: f64) -> Option<GlobalSummary> {
    if deaths.headers.is_empty() {
        return None;
    }
    let last_date = confirmed.headers.last()?;
    let total = |table: &Table| -> i64 {
        table
            .rows
            .iter()
            .map(|row| parse_int(Table::field(row, last_date)))
            .sum()
    };
    Some(GlobalSummary::estimate(
        total(confirmed),
        total(deaths),
        last_date.as_str(),
        ratio,
    ))
}
