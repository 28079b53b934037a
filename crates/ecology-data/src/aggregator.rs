//! Environment-conditioned statistics over the exploded dataset.
//!
//! Every method returns `None` when the exploded input is empty, so callers
//! can tell "nothing to summarize" apart from a table of zeros.

use std::collections::HashMap;

use ecology_core::models::{
    CorrelationSummary, MovementMode, NumericColumn, SummaryRow, SummaryTable,
};
use ecology_core::stats::{linear_fit, mean, pearson, percent};
use tracing::debug;

use crate::exploder::ExplodedRow;

/// Frequency of each key in first-appearance order, then sorted descending
/// by count. The sort is stable, so ties keep first-appearance order.
fn ranked_counts<'k>(keys: impl Iterator<Item = &'k str>) -> Vec<(&'k str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Sort rows descending by their first value; rows without a value go last.
fn sort_rows_descending(rows: &mut [SummaryRow]) {
    rows.sort_by(|a, b| {
        let av = a.values.first().copied().flatten();
        let bv = b.values.first().copied().flatten();
        match (av, bv) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Grouped statistics over a borrowed slice of exploded rows.
pub struct AggregationEngine<'a> {
    rows: &'a [ExplodedRow<'a>],
    /// Parsed challenge rating per exploded row.
    cr: Vec<Option<f64>>,
}

impl<'a> AggregationEngine<'a> {
    pub fn new(rows: &'a [ExplodedRow<'a>]) -> Self {
        let cr = rows.iter().map(|e| e.row.cr_value()).collect();
        Self { rows, cr }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Read `column` for the `i`-th exploded row, using the cached CR.
    fn value(&self, i: usize, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::Cr => self.cr[i],
            other => other.value(self.rows[i].row),
        }
    }

    /// Environments ranked by exploded-row count.
    fn ranked_environments(&self) -> Vec<(&'a str, usize)> {
        ranked_counts(self.rows.iter().map(|e| e.environment))
    }

    fn top_environments(&self, top_k: usize) -> Vec<&'a str> {
        self.ranked_environments()
            .into_iter()
            .take(top_k)
            .map(|(env, _)| env)
            .collect()
    }

    /// Indices of the exploded rows in `environment`.
    fn indices_in(&self, environment: &str) -> Vec<usize> {
        (0..self.rows.len())
            .filter(|&i| self.rows[i].environment == environment)
            .collect()
    }

    /// Monsters per environment, most populous first.
    pub fn environment_counts(&self) -> Option<SummaryTable> {
        if self.rows.is_empty() {
            return None;
        }
        let mut table = SummaryTable::new(
            "Monsters per environment",
            "environment",
            vec!["count".to_string()],
        );
        for (env, count) in self.ranked_environments() {
            table.push_row(env, vec![Some(count as f64)]);
        }
        Some(table)
    }

    /// Mean of `column` per environment, ignoring rows without a value.
    ///
    /// Environments where no row has a value report `None` and sort last.
    /// Returns `None` when no environment has a value at all.
    pub fn mean_by_environment(&self, column: NumericColumn) -> Option<SummaryTable> {
        if self.rows.is_empty() {
            return None;
        }
        let mut table = SummaryTable::new(
            format!("Mean {} by environment", column),
            "environment",
            vec![column.name().to_string()],
        );
        for (env, _) in self.ranked_environments() {
            let values: Vec<f64> = self
                .indices_in(env)
                .into_iter()
                .filter_map(|i| self.value(i, column))
                .collect();
            table.push_row(env, vec![mean(&values)]);
        }
        if table.rows.iter().all(|r| r.values[0].is_none()) {
            debug!("no {} values in any environment", column);
            return None;
        }
        sort_rows_descending(&mut table.rows);
        Some(table)
    }

    /// Share of monsters with each non-walking movement mode, for the
    /// `top_k` most populous environments.
    pub fn movement_adaptation_pct(&self, top_k: usize) -> Option<SummaryTable> {
        if self.rows.is_empty() {
            return None;
        }
        let columns = MovementMode::ADAPTATIONS
            .iter()
            .map(|m| m.label().to_string())
            .collect();
        let mut table = SummaryTable::new(
            "Movement adaptations by environment (%)",
            "environment",
            columns,
        );
        for env in self.top_environments(top_k) {
            let indices = self.indices_in(env);
            let values = MovementMode::ADAPTATIONS
                .iter()
                .map(|&mode| {
                    let hits = indices
                        .iter()
                        .filter(|&&i| self.rows[i].row.speed.get(mode) > 0)
                        .count();
                    percent(hits, indices.len())
                })
                .collect();
            table.push_row(env, values);
        }
        Some(table)
    }

    /// Share of monsters resisting or immune to each damage keyword, for the
    /// `top_k` most populous environments. Vulnerabilities do not count.
    pub fn damage_adaptation_pct<S: AsRef<str>>(
        &self,
        damage_types: &[S],
        top_k: usize,
    ) -> Option<SummaryTable> {
        if self.rows.is_empty() || damage_types.is_empty() {
            return None;
        }
        let keywords: Vec<String> = damage_types
            .iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .collect();
        let mut table = SummaryTable::new(
            "Damage resistance/immunity by environment (%)",
            "environment",
            keywords.clone(),
        );
        for env in self.top_environments(top_k) {
            let texts: Vec<String> = self
                .indices_in(env)
                .into_iter()
                .map(|i| self.rows[i].row.adaptation_text())
                .collect();
            let values = keywords
                .iter()
                .map(|kw| {
                    let hits = texts.iter().filter(|t| t.contains(kw.as_str())).count();
                    percent(hits, texts.len())
                })
                .collect();
            table.push_row(env, values);
        }
        Some(table)
    }

    /// Pearson correlation and least-squares line of `column` against CR.
    ///
    /// `None` when fewer than two rows have both values.
    pub fn stat_vs_cr_correlation(&self, column: NumericColumn) -> Option<CorrelationSummary> {
        let pairs: Vec<(f64, f64)> = (0..self.rows.len())
            .filter_map(|i| Some((self.cr[i]?, self.value(i, column)?)))
            .collect();
        if pairs.len() < 2 {
            debug!("{} vs cr: {} usable pairs, skipping", column, pairs.len());
            return None;
        }
        Some(CorrelationSummary {
            column: column.name().to_string(),
            pairs: pairs.len(),
            pearson_r: pearson(&pairs),
            fit: linear_fit(&pairs),
        })
    }

    /// Type × environment composition, one column per environment.
    ///
    /// Restricted to the `top_types` most common types and `top_environments`
    /// most populous environments. Each cell is that type's share of the
    /// column total within the retained types.
    pub fn type_composition_pivot(
        &self,
        top_types: usize,
        top_environments: usize,
    ) -> Option<SummaryTable> {
        if self.rows.is_empty() {
            return None;
        }
        let types: Vec<&str> = ranked_counts(self.rows.iter().map(|e| e.row.kind.as_str()))
            .into_iter()
            .take(top_types)
            .map(|(kind, _)| kind)
            .collect();
        let environments = self.top_environments(top_environments);

        let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
        for e in self.rows {
            let kind = e.row.kind.as_str();
            if types.contains(&kind) && environments.contains(&e.environment) {
                *counts.entry((kind, e.environment)).or_default() += 1;
            }
        }

        let column_totals: Vec<usize> = environments
            .iter()
            .map(|env| {
                types
                    .iter()
                    .map(|kind| counts.get(&(*kind, *env)).copied().unwrap_or(0))
                    .sum()
            })
            .collect();

        let mut table = SummaryTable::new(
            "Creature type composition by environment (%)",
            "type",
            environments.iter().map(|e| e.to_string()).collect(),
        );
        for kind in &types {
            let values = environments
                .iter()
                .zip(&column_totals)
                .map(|(env, &total)| {
                    let n = counts.get(&(*kind, *env)).copied().unwrap_or(0);
                    percent(n, total)
                })
                .collect();
            table.push_row(*kind, values);
        }
        Some(table)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
