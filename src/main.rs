use anyhow::Result;
use covidscraper::{
    config::Config,
    export::{self, Dataset, DirectorySink, Sink},
    fetch::{self, HttpSource},
    metrics::{classify_trend, daily_deltas, rolling_average, tail, trend, FORTNIGHT, WEEK},
    process::series::{date_columns, series_for},
    report::{self, Row},
    state::{CovidData, Selection},
};
use std::{env, path::PathBuf};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,covidscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    let urls = config.urls()?;

    // ─── 3) fetch confirmed + deaths together ────────────────────────
    let start = Instant::now();
    let source = HttpSource::new(config.timeout())?;
    let data = CovidData::from(fetch::fetch_datasets(&source, &urls, config.quote_mode).await?);
    info!(elapsed = ?start.elapsed(), countries = data.countries().len(), "data ready");

    // ─── 4) resolve the selection ────────────────────────────────────
    let selection = Selection::new(config.countries.iter().cloned());
    let known = data.countries();
    for country in selection.as_slice() {
        if !known.contains(country) {
            warn!(%country, "selected country not present in confirmed data");
        }
    }

    let dates = date_columns(&data.confirmed);
    for country in selection.as_slice() {
        let daily = daily_deltas(&series_for(&data.confirmed, country, dates));
        let direction = classify_trend(trend(tail(&daily, FORTNIGHT)));
        let smoothed = rolling_average(&daily, WEEK);
        info!(
            %country,
            latest = daily.last().copied().unwrap_or(0),
            smoothed_7d = smoothed.last().copied().unwrap_or(0),
            trend = %direction,
            "new cases"
        );
    }

    // ─── 5) build and save the reports ───────────────────────────────
    let sink = DirectorySink::new(&config.output_dir)?;
    save(&sink, Dataset::Full, &data.full_export(&selection))?;
    save(&sink, Dataset::Countries, &data.country_summary(&selection))?;

    match data.global_summary(config.recovery_ratio) {
        Some(summary) => {
            info!(
                confirmed = summary.confirmed,
                deaths = summary.deaths,
                recovered_estimate = summary.recovered,
                active_estimate = summary.active,
                last_update = %summary.last_update,
                "global summary"
            );
            save(&sink, Dataset::GlobalStats, &report::global_stats(&summary))?;
        }
        None => warn!("no global summary; tables have no columns"),
    }

    info!("all done");
    Ok(())
}

fn save(sink: &impl Sink, dataset: Dataset, rows: &[Row]) -> Result<()> {
    if rows.is_empty() {
        warn!(dataset = dataset.stem(), "nothing to export");
        return Ok(());
    }
    let filename = export::filename_for_today(dataset);
    sink.save(&filename, &export::to_csv(rows))?;
    Ok(())
}
