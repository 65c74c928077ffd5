// src/metrics/mod.rs
use std::fmt;

/// Days in a rolling average window.
pub const WEEK: usize = 7;
/// Days considered when comparing two consecutive weeks.
pub const FORTNIGHT: usize = 14;
/// A trend beyond ±this many cases per day is classified as rising/falling.
pub const TREND_THRESHOLD: i64 = 5;

/// Direction of a trend value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
            Trend::Stable => "Stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day-over-day increases of a cumulative series.
/// The first entry is 0 and decreases (data corrections) are clamped to 0.
pub fn daily_deltas(cumulative: &[i64]) -> Vec<i64> {
    std::iter::once(0)
        .chain(
            cumulative
                .windows(2)
                .map(|w| w[1].saturating_sub(w[0]).max(0)),
        )
        .take(cumulative.len())
        .collect()
}

/// Rounds halves towards +∞ (`2.5` → 3, `-2.5` → -2).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Rounded mean of the non-NaN values, 0 when there are none.
pub fn average_of<I>(values: I) -> i64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        0
    } else {
        round_half_up(sum / count as f64)
    }
}

/// Rounded mean of `values`, 0 for an empty slice.
pub fn average(values: &[i64]) -> i64 {
    average_of(values.iter().map(|&v| v as f64))
}

/// Second-week average minus first-week average over the first 14 values.
/// Fewer than 7 values give 0.
pub fn trend(values: &[i64]) -> i64 {
    if values.len() < WEEK {
        return 0;
    }
    let first = &values[..WEEK];
    let second = &values[WEEK..values.len().min(FORTNIGHT)];
    average(second).saturating_sub(average(first))
}

pub fn classify_trend(value: i64) -> Trend {
    if value > TREND_THRESHOLD {
        Trend::Rising
    } else if value < -TREND_THRESHOLD {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

/// Trailing mean at every index; the window is shorter at the start of the series.
pub fn rolling_average(values: &[i64], window: usize) -> Vec<i64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| average(&values[(i + 1).saturating_sub(window)..=i]))
        .collect()
}

/// The last `n` values (all of them when there are fewer).
pub fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

/// Increase between the last two points of a cumulative series, floored at 0.
/// Missing points count as 0. Saturates instead of overflowing.
pub fn latest_delta(cumulative: &[i64]) -> i64 {
    let last = cumulative.last().copied().unwrap_or(0);
    let previous = cumulative
        .len()
        .checked_sub(2)
        .map(|i| cumulative[i])
        .unwrap_or(0);
    last.saturating_sub(previous).max(0)
}
