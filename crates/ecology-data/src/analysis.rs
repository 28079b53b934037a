//! Main analysis pipeline for monster-ecology.
//!
//! Explodes the canonical dataset by environment and runs every summary of
//! the aggregation engine, returning an [`EcologyReport`] ready for the UI
//! layer or JSON output.

use chrono::Utc;
use ecology_core::models::{CorrelationSummary, NumericColumn, SummaryTable};
use ecology_core::settings::{Settings, DEFAULT_DAMAGE_TYPES};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregator::AggregationEngine;
use crate::assembler::Dataset;

// ── Options ───────────────────────────────────────────────────────────────────

/// Knobs for [`analyze_dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Environments kept in the damage heatmap and type pivot.
    pub top_environments: usize,
    /// Environments kept in the movement chart.
    pub top_movement_environments: usize,
    pub top_types: usize,
    pub damage_types: Vec<String>,
    /// Stats correlated against CR.
    pub correlation_columns: Vec<NumericColumn>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_environments: 10,
            top_movement_environments: 8,
            top_types: 8,
            damage_types: DEFAULT_DAMAGE_TYPES
                .split(',')
                .map(str::to_string)
                .collect(),
            correlation_columns: vec![
                NumericColumn::Hp,
                NumericColumn::Str,
                NumericColumn::Dex,
                NumericColumn::Int,
            ],
        }
    }
}

impl From<&Settings> for AnalysisOptions {
    fn from(s: &Settings) -> Self {
        Self {
            top_environments: s.top_environments as usize,
            top_movement_environments: s.top_movement_environments as usize,
            top_types: s.top_types as usize,
            damage_types: s.damage_type_list(),
            ..Self::default()
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Monsters in the canonical dataset.
    pub monsters: usize,
    /// Rows after environment explosion.
    pub exploded_rows: usize,
    /// Monsters without any environment (absent from every table).
    pub monsters_without_environment: usize,
    /// Wall-clock seconds spent aggregating.
    pub analysis_time_seconds: f64,
}

/// Every environment-conditioned summary of one dataset.
///
/// A summary is `None` when there was nothing to aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcologyReport {
    pub metadata: ReportMetadata,
    pub environment_counts: Option<SummaryTable>,
    pub mean_cr_by_environment: Option<SummaryTable>,
    pub movement_adaptation: Option<SummaryTable>,
    pub damage_adaptation: Option<SummaryTable>,
    pub type_composition: Option<SummaryTable>,
    pub correlations: Vec<CorrelationSummary>,
}

impl EcologyReport {
    /// Correlation digest as a table, one row per stat.
    pub fn correlation_table(&self) -> Option<SummaryTable> {
        if self.correlations.is_empty() {
            return None;
        }
        let mut table = SummaryTable::new(
            "Stats vs challenge rating",
            "stat",
            ["pairs", "pearson_r", "slope", "intercept"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        for c in &self.correlations {
            table.push_row(
                c.column.clone(),
                vec![
                    Some(c.pairs as f64),
                    c.pearson_r,
                    c.fit.map(|f| f.slope),
                    c.fit.map(|f| f.intercept),
                ],
            );
        }
        Some(table)
    }

    /// All present tables in display order.
    pub fn tables(&self) -> Vec<SummaryTable> {
        [
            self.environment_counts.clone(),
            self.mean_cr_by_environment.clone(),
            self.movement_adaptation.clone(),
            self.damage_adaptation.clone(),
            self.type_composition.clone(),
            self.correlation_table(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Explode the dataset into (monster, environment) rows.
/// 2. Cache parsed challenge ratings in an [`AggregationEngine`].
/// 3. Compute every summary table and the CR correlations.
/// 4. Return an [`EcologyReport`].
pub fn analyze_dataset(dataset: &Dataset, options: &AnalysisOptions) -> EcologyReport {
    let start = std::time::Instant::now();

    // ── Step 1: Explode ───────────────────────────────────────────────────────
    let exploded = dataset.explode();
    let without_environment = dataset
        .rows()
        .iter()
        .filter(|r| r.environment.iter().all(|e| e.trim().is_empty()))
        .count();
    debug!(
        "{} monsters exploded into {} rows ({} without environment)",
        dataset.len(),
        exploded.len(),
        without_environment
    );

    // ── Step 2: Engine ────────────────────────────────────────────────────────
    let engine = AggregationEngine::new(&exploded);

    // ── Step 3: Summaries ─────────────────────────────────────────────────────
    let environment_counts = engine.environment_counts();
    let mean_cr_by_environment = engine.mean_by_environment(NumericColumn::Cr);
    let movement_adaptation = engine.movement_adaptation_pct(options.top_movement_environments);
    let damage_adaptation =
        engine.damage_adaptation_pct(&options.damage_types, options.top_environments);
    let type_composition =
        engine.type_composition_pivot(options.top_types, options.top_environments);
    let correlations: Vec<CorrelationSummary> = options
        .correlation_columns
        .iter()
        .filter_map(|&column| engine.stat_vs_cr_correlation(column))
        .collect();

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "Analyzed {} monsters ({} exploded rows) in {:.3}s",
        dataset.len(),
        exploded.len(),
        elapsed
    );

    // ── Step 4: Report ────────────────────────────────────────────────────────
    EcologyReport {
        metadata: ReportMetadata {
            generated_at: Utc::now().to_rfc3339(),
            monsters: dataset.len(),
            exploded_rows: exploded.len(),
            monsters_without_environment: without_environment,
            analysis_time_seconds: elapsed,
        },
        environment_counts,
        mean_cr_by_environment,
        movement_adaptation,
        damage_adaptation,
        type_composition,
        correlations,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
