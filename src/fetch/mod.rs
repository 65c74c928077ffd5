// src/fetch/mod.rs

use crate::process::{parse_with, QuoteMode, Table};
use anyhow::{Context, Result};
use reqwest::Client;
use std::{future::Future, time::Duration};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};
use url::Url;

/// Source of raw CSV text. The only networking seam of the crate.
pub trait TextSource {
    fn fetch_text(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

/// [`TextSource`] backed by a `reqwest` client.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl TextSource for HttpSource {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!("Fetching text from {}", url);
        Ok(self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))?)
    }
}

/// Locations of the two time-series files.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrls {
    pub confirmed: Url,
    pub deaths: Url,
}

/// Both parsed tables. Only ever built when both downloads succeeded.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub confirmed: Table,
    pub deaths: Table,
}

/// Fetch the confirmed and deaths CSVs concurrently and parse them.
/// Either failure aborts the whole fetch; there are no retries.
#[instrument(level = "info", skip(source, urls), fields(confirmed = %urls.confirmed, deaths = %urls.deaths))]
pub async fn fetch_datasets<S: TextSource>(
    source: &S,
    urls: &DataUrls,
    mode: QuoteMode,
) -> Result<Datasets> {
    let start = Instant::now();
    let (confirmed, deaths) = match tokio::try_join!(
        source.fetch_text(&urls.confirmed),
        source.fetch_text(&urls.deaths)
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "fetch failed");
            return Err(e);
        }
    };
    debug!(
        confirmed_bytes = confirmed.len(),
        deaths_bytes = deaths.len(),
        "downloaded"
    );

    let datasets = Datasets {
        confirmed: parse_with(&confirmed, mode),
        deaths: parse_with(&deaths, mode),
    };
    info!(
        confirmed_rows = datasets.confirmed.rows.len(),
        deaths_rows = datasets.deaths.rows.len(),
        elapsed = ?start.elapsed(),
        "fetched datasets"
    );
    Ok(datasets)
}
