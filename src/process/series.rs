//! Reshape a wide time-series table (one column per date) into per-country series.

use super::{Record, Table};
use std::collections::BTreeSet;

/// Columns before the first date column: province, country, latitude, longitude.
pub const METADATA_COLUMNS: usize = 4;

pub const COUNTRY_COLUMN: &str = "Country/Region";
pub const LAT_COLUMN: &str = "Lat";
pub const LONG_COLUMN: &str = "Long";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// The date labels of `table`, in column order.
pub fn date_columns(table: &Table) -> &[String] {
    table.headers.get(METADATA_COLUMNS..).unwrap_or(&[])
}

/// Per-date totals over every row whose country matches `country` case-insensitively.
/// An unknown country gives a zero series of `dates.len()`.
pub fn series_for(table: &Table, country: &str, dates: &[String]) -> Vec<i64> {
    let wanted = country.to_lowercase();
    sum_by_date(
        matching_rows(table, |c| c.to_lowercase() == wanted),
        dates,
    )
}

/// Same as [`series_for`] but with exact string equality, as used for grouping.
pub fn series_for_exact(table: &Table, country: &str, dates: &[String]) -> Vec<i64> {
    sum_by_date(matching_rows(table, |c| c == country), dates)
}

/// Distinct non-empty country names, sorted ascending.
pub fn list_countries(table: &Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row| Table::field(row, COUNTRY_COLUMN))
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Mean of the valid lat/long pairs of a country's rows, `None` when there are none.
pub fn average_coordinates(table: &Table, country: &str) -> Option<Coordinates> {
    let wanted = country.to_lowercase();
    let (lat, lng, count) = matching_rows(table, |c| c.to_lowercase() == wanted)
        .filter_map(|row| {
            let lat = parse_float(Table::field(row, LAT_COLUMN))?;
            let lng = parse_float(Table::field(row, LONG_COLUMN))?;
            Some((lat, lng))
        })
        .fold((0.0, 0.0, 0usize), |(la, lo, n), (lat, lng)| {
            (la + lat, lo + lng, n + 1)
        });

    (count > 0).then(|| Coordinates {
        lat: lat / count as f64,
        lng: lng / count as f64,
    })
}

fn matching_rows<'a, F>(table: &'a Table, mut matches: F) -> impl Iterator<Item = &'a Record>
where
    F: FnMut(&str) -> bool + 'a,
{
    table
        .rows
        .iter()
        .filter(move |row| matches(Table::field(row, COUNTRY_COLUMN)))
}

fn sum_by_date<'a>(rows: impl Iterator<Item = &'a Record>, dates: &[String]) -> Vec<i64> {
    let rows: Vec<&Record> = rows.collect();
    dates
        .iter()
        .map(|date| {
            rows.iter()
                .map(|row| parse_int(Table::field(row, date)))
                .fold(0i64, i64::saturating_add)
        })
        .collect()
}

/// Lenient integer parse: optional sign plus leading digits, anything else is 0.
/// `"12abc"` → 12, `"3.9"` → 3, `""` → 0. Out-of-range values saturate.
pub fn parse_int(raw: &str) -> i64 {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits.as_bytes()[..end]
        .iter()
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative {
        -value
    } else {
        value
    }
}

/// Lenient float parse of the leading decimal number (`"1.5deg"` → 1.5).
/// `None` when the text does not start with one. `Infinity` is the only
/// spelled-out value accepted.
pub fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
    };

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[sign..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let mut end = digits_from(sign);
    let mut mantissa = end - sign;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            mantissa += frac_end - end - 1;
            end = frac_end;
        }
    }
    if mantissa == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + exp_sign);
        if exp_end > end + 1 + exp_sign {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse;

    const SAMPLE: &str = "\
Province/State,Country/Region,Lat,Long,1/1/20,1/2/20,1/3/20,1/4/20,1/5/20
North,Narnia,10.0,20.0,4,4,6,6,8
South,Narnia,20.0,40.0,3,3,5,5,7
,Narnia,,,3,3,4,4,5
,Oz,-5.5,7.25,1,2,x,4,
";

    #[test]
    fn test_date_columns_skip_metadata() {
        let table = parse(SAMPLE);
        assert_eq!(
            date_columns(&table),
            &["1/1/20", "1/2/20", "1/3/20", "1/4/20", "1/5/20"]
        );
        assert!(date_columns(&parse("a,b,c")).is_empty());
    }

    #[test]
    fn test_series_sums_sub_regions() {
        let table = parse(SAMPLE);
        let dates = date_columns(&table);
        assert_eq!(series_for(&table, "Narnia", dates), vec![10, 10, 15, 15, 20]);
    }

    #[test]
    fn test_series_match_is_case_insensitive_but_grouping_is_exact() {
        let table = parse(SAMPLE);
        let dates = date_columns(&table);
        assert_eq!(series_for(&table, "nArNiA", dates), vec![10, 10, 15, 15, 20]);
        assert_eq!(series_for_exact(&table, "narnia", dates), vec![0; 5]);
        assert_eq!(
            series_for_exact(&table, "Narnia", dates),
            vec![10, 10, 15, 15, 20]
        );
    }

    #[test]
    fn test_non_numeric_cells_count_as_zero() {
        let table = parse(SAMPLE);
        let dates = date_columns(&table);
        assert_eq!(series_for(&table, "Oz", dates), vec![1, 2, 0, 4, 0]);
    }

    #[test]
    fn test_unknown_country_is_all_zero() {
        let table = parse(SAMPLE);
        let dates = date_columns(&table);
        assert_eq!(series_for(&table, "Atlantis", dates), vec![0; dates.len()]);
    }

    #[test]
    fn test_list_countries_sorted_and_distinct() {
        let table = parse(SAMPLE);
        assert_eq!(list_countries(&table), vec!["Narnia", "Oz"]);
    }

    #[test]
    fn test_average_coordinates_skips_missing_pairs() {
        let table = parse(SAMPLE);
        let coords = average_coordinates(&table, "narnia").unwrap();
        assert_eq!(coords, Coordinates { lat: 15.0, lng: 30.0 });
        assert_eq!(average_coordinates(&table, "Atlantis"), None);
    }

    #[test]
    fn test_average_coordinates_none_without_valid_pairs() {
        let table = parse("p,Country/Region,Lat,Long,d1\n,Void,,abc,1\n");
        assert_eq!(average_coordinates(&table, "Void"), None);
    }

    #[test]
    fn test_lenient_number_parsing() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int(" -7 "), -7);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("3.9"), 3);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_float("1.5deg"), Some(1.5));
        assert_eq!(parse_float("-33.8688"), Some(-33.8688));
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn test_parse_int_saturates() {
        assert_eq!(parse_int("99999999999999999999"), i64::MAX);
        assert_eq!(parse_int("-99999999999999999999"), -i64::MAX);
        assert_eq!(parse_int("9223372036854775807"), i64::MAX);
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let table = parse(&format!(
            "p,Country/Region,Lat,Long,d1\n,Big,0,0,{}\n,Big,0,0,1\n",
            i64::MAX
        ));
        let dates = date_columns(&table);
        assert_eq!(series_for(&table, "Big", dates), vec![i64::MAX]);
    }

    #[test]
    fn test_parse_float_takes_leading_number_only() {
        assert_eq!(parse_float("1e3x"), Some(1000.0));
        assert_eq!(parse_float("2.5E-1"), Some(0.25));
        assert_eq!(parse_float("7e"), Some(7.0));
        assert_eq!(parse_float("-.5"), Some(-0.5));
        assert_eq!(parse_float("3.x"), Some(3.0));
        assert_eq!(parse_float("+4"), Some(4.0));
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("e5"), None);
    }

    #[test]
    fn test_parse_float_spelled_out_values() {
        assert_eq!(parse_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("infinity"), None);
        assert_eq!(parse_float("nan"), None);
    }

    #[test]
    fn test_parse_float_long_input() {
        let long = format!("12.5{}", "z".repeat(100_000));
        assert_eq!(parse_float(&long), Some(12.5));
        assert_eq!(parse_float(&"z".repeat(100_000)), None);
    }
}
