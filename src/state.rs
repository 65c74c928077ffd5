// src/state.rs

use crate::fetch::Datasets;
use crate::process::{series::list_countries, Table};
use crate::report::{self, GlobalSummary, Row};

/// Ordered list of the countries a user is looking at.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    countries: Vec<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(["US", "Italy", "France", "Germany"].map(String::from))
    }
}

impl Selection {
    /// Keeps first occurrences only.
    pub fn new(countries: impl IntoIterator<Item = String>) -> Self {
        let mut selection = Self {
            countries: Vec::new(),
        };
        for country in countries {
            selection.add(country);
        }
        selection
    }

    /// No-op when already selected.
    pub fn add(&mut self, country: impl Into<String>) {
        let country = country.into();
        if !self.contains(&country) {
            self.countries.push(country);
        }
    }

    /// No-op when not selected.
    pub fn remove(&mut self, country: &str) {
        self.countries.retain(|c| c != country);
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.countries
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// The two tables of one fetch, plus the reports derived from them.
#[derive(Debug, Clone, Default)]
pub struct CovidData {
    pub confirmed: Table,
    pub deaths: Table,
}

impl From<Datasets> for CovidData {
    fn from(d: Datasets) -> Self {
        Self {
            confirmed: d.confirmed,
            deaths: d.deaths,
        }
    }
}

impl CovidData {
    pub fn countries(&self) -> Vec<String> {
        list_countries(&self.confirmed)
    }

    pub fn global_summary(&self, recovery_ratio: f64) -> Option<GlobalSummary> {
        report::summarize(&self.confirmed, &self.deaths, recovery_ratio)
    }

    pub fn full_export(&self, selection: &Selection) -> Vec<Row> {
        report::full_export(&self.confirmed, Some(&self.deaths), selection.as_slice())
    }

    pub fn country_summary(&self, selection: &Selection) -> Vec<Row> {
        report::country_summary(&self.confirmed, Some(&self.deaths), selection.as_slice())
    }
}
