mod bootstrap;

use std::path::Path;

use anyhow::{Context, Result};
use ecology_core::settings::Settings;
use ecology_data::analysis::{analyze_dataset, AnalysisOptions, EcologyReport};
use ecology_data::assembler::Dataset;
use ecology_data::explorer::{cr_range, explore, matching_count, summary_line, ExplorerQuery};
use ecology_data::store::{load_dataset, save_dataset};
use ecology_runtime::fetcher::DatasetFetcher;
use ecology_runtime::source::HttpPageSource;
use ecology_ui::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Monster Ecology v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Dataset: {}, Theme: {}",
        settings.view,
        settings.dataset_path().display(),
        settings.theme
    );

    match settings.view.as_str() {
        "fetch" => run_fetch(&settings).await?,
        "report" => run_report(&settings)?,
        "summary" => run_summary(&settings)?,
        "explore" => run_explore(&settings)?,
        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
        }
    }

    Ok(())
}

/// Download every page, normalize it and persist the canonical dataset.
async fn run_fetch(settings: &Settings) -> Result<()> {
    let source = HttpPageSource::new()?;
    let dataset = DatasetFetcher::new(source)
        .with_max_pages(settings.max_pages)
        .fetch_all(&settings.api_url)
        .await
        .with_context(|| format!("fetching monsters from {}", settings.api_url))?;

    let path = settings.dataset_path();
    save_dataset(dataset.rows(), &path)?;
    println!("Saved {} monsters to {}", dataset.len(), path.display());
    Ok(())
}

fn load(path: &Path) -> Result<Dataset> {
    load_dataset(path).with_context(|| {
        format!(
            "cannot load dataset {}; run with --view fetch first",
            path.display()
        )
    })
}

fn analyze(settings: &Settings) -> Result<EcologyReport> {
    let dataset = load(&settings.dataset_path())?;
    Ok(analyze_dataset(&dataset, &AnalysisOptions::from(settings)))
}

/// Show every summary table in the terminal viewer.
fn run_report(settings: &Settings) -> Result<()> {
    let report = analyze(settings)?;
    let subtitle = format!(
        "{} monsters · {} environment rows · {} without environment",
        report.metadata.monsters,
        report.metadata.exploded_rows,
        report.metadata.monsters_without_environment
    );
    App::new(&settings.theme, subtitle, report.tables()).run()?;
    Ok(())
}

/// Write the report as JSON to `--output` or stdout.
fn run_summary(settings: &Settings) -> Result<()> {
    let report = analyze(settings)?;
    let json = serde_json::to_string_pretty(&report)?;
    match &settings.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("cannot write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// One filtered grouping of the dataset in the terminal viewer.
fn run_explore(settings: &Settings) -> Result<()> {
    let query = ExplorerQuery::from_settings(settings)?;
    let dataset = load(&settings.dataset_path())?;

    let range = match cr_range(dataset.rows()) {
        Some((lo, hi)) => format!("dataset CR {lo}–{hi}"),
        None => "no parseable CR".to_string(),
    };
    tracing::debug!(?query, "running explorer");

    let table = explore(dataset.rows(), &query);
    let matched = matching_count(dataset.rows(), &query);
    let subtitle = format!(
        "{} · {}",
        summary_line(table.as_ref(), matched, &query),
        range
    );

    let tables = table.into_iter().collect();
    App::new(&settings.theme, subtitle, tables).run()?;
    Ok(())
}
