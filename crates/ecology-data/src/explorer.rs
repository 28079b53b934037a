//! Ad-hoc grouped queries over the canonical dataset.
//!
//! Unlike the aggregation engine, the explorer counts each monster once and
//! groups by its first listed environment.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ecology_core::error::{EcologyError, Result};
use ecology_core::formatting::{format_number, format_percent};
use ecology_core::models::{CanonicalRow, SummaryTable};
use ecology_core::settings::Settings;
use ecology_core::stats::{mean, percent};

/// Label for rows with no value in the grouping dimension.
const UNKNOWN_GROUP: &str = "Unknown";

/// Grouping dimension for an explorer query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    Environment,
    Type,
    Size,
}

impl Dimension {
    pub fn name(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Type => "type",
            Self::Size => "size",
        }
    }

    /// Group key of `row`, `"Unknown"` when blank.
    fn key(self, row: &CanonicalRow) -> &str {
        let raw = match self {
            Self::Environment => row.environment.first().map(String::as_str).unwrap_or(""),
            Self::Type => row.kind.as_str(),
            Self::Size => row.size.as_str(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            UNKNOWN_GROUP
        } else {
            trimmed
        }
    }
}

impl FromStr for Dimension {
    type Err = EcologyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "environment" => Ok(Self::Environment),
            "type" => Ok(Self::Type),
            "size" => Ok(Self::Size),
            other => Err(EcologyError::Config(format!("unknown dimension \"{other}\""))),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value computed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Count,
    AvgCr,
    AvgHp,
    AvgAc,
    PctFly,
    PctSwim,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::AvgCr => "avg_cr",
            Self::AvgHp => "avg_hp",
            Self::AvgAc => "avg_ac",
            Self::PctFly => "pct_fly",
            Self::PctSwim => "pct_swim",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Count => "Number of monsters",
            Self::AvgCr => "Average challenge rating",
            Self::AvgHp => "Average hit points",
            Self::AvgAc => "Average armor class",
            Self::PctFly => "Percent of monsters that can fly",
            Self::PctSwim => "Percent of monsters that can swim",
        }
    }

    fn evaluate(self, members: &[(&CanonicalRow, f64)]) -> Option<f64> {
        let int_mean = |pick: fn(&CanonicalRow) -> Option<i64>| {
            let values: Vec<f64> = members
                .iter()
                .filter_map(|(row, _)| pick(row).map(|v| v as f64))
                .collect();
            mean(&values)
        };
        match self {
            Self::Count => Some(members.len() as f64),
            Self::AvgCr => mean(&members.iter().map(|(_, cr)| *cr).collect::<Vec<_>>()),
            Self::AvgHp => int_mean(|r| r.hp),
            Self::AvgAc => int_mean(|r| r.ac),
            Self::PctFly => percent(
                members.iter().filter(|(r, _)| r.speed.fly > 0).count(),
                members.len(),
            ),
            Self::PctSwim => percent(
                members.iter().filter(|(r, _)| r.speed.swim > 0).count(),
                members.len(),
            ),
        }
    }
}

impl FromStr for Metric {
    type Err = EcologyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        [
            Self::Count,
            Self::AvgCr,
            Self::AvgHp,
            Self::AvgAc,
            Self::PctFly,
            Self::PctSwim,
        ]
        .into_iter()
        .find(|m| m.name() == wanted)
        .ok_or_else(|| EcologyError::Config(format!("unknown metric \"{}\"", s.trim())))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filters and grouping for [`explore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorerQuery {
    pub dimension: Dimension,
    pub metric: Metric,
    /// Inclusive lower CR bound.
    pub cr_min: Option<f64>,
    /// Inclusive upper CR bound.
    pub cr_max: Option<f64>,
    pub only_fly: bool,
    pub only_swim: bool,
}

impl ExplorerQuery {
    /// Query described by the `--dimension`, `--metric` and filter flags.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            dimension: settings.dimension.parse()?,
            metric: settings.metric.parse()?,
            cr_min: settings.cr_min,
            cr_max: settings.cr_max,
            only_fly: settings.only_fly,
            only_swim: settings.only_swim,
        })
    }

    /// Whether `row` passes the filters. Rows without a parseable CR never do.
    pub fn matches(&self, row: &CanonicalRow) -> bool {
        row.cr_value().is_some_and(|cr| self.admits(row, cr))
    }

    fn admits(&self, row: &CanonicalRow, cr: f64) -> bool {
        if self.cr_min.is_some_and(|min| cr < min) || self.cr_max.is_some_and(|max| cr > max) {
            return false;
        }
        if self.only_fly && row.speed.fly == 0 {
            return false;
        }
        !(self.only_swim && row.speed.swim == 0)
    }
}

/// Group the monsters matching `query` and compute its metric per group.
///
/// Rows with an unparseable challenge rating never match. Groups without a
/// metric value are dropped; the rest are sorted by value, highest first.
/// Returns `None` when no monster matches.
pub fn explore(rows: &[CanonicalRow], query: &ExplorerQuery) -> Option<SummaryTable> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<(&CanonicalRow, f64)>> = HashMap::new();
    for row in rows {
        let Some(cr) = row.cr_value() else {
            continue;
        };
        if !query.admits(row, cr) {
            continue;
        }
        let key = query.dimension.key(row);
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push((row, cr));
    }
    if order.is_empty() {
        return None;
    }

    let mut table = SummaryTable::new(
        format!("{} by {}", query.metric.label(), query.dimension),
        query.dimension.name(),
        vec![query.metric.name().to_string()],
    );
    let mut results: Vec<(&str, f64)> = order
        .into_iter()
        .filter_map(|key| Some((key, query.metric.evaluate(&groups[key])?)))
        .collect();
    results.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (key, value) in results {
        table.push_row(key, vec![Some(value)]);
    }
    Some(table)
}

/// Number of monsters left after the filters of `query`.
pub fn matching_count(rows: &[CanonicalRow], query: &ExplorerQuery) -> usize {
    rows.iter().filter(|row| query.matches(row)).count()
}

/// One-line description of an explorer result, e.g.
/// `Showing 3 type groups (12 monsters after filters). Top group: Beast (Number of monsters: 7).`
pub fn summary_line(
    table: Option<&SummaryTable>,
    matched: usize,
    query: &ExplorerQuery,
) -> String {
    let groups = table.map_or(0, |t| t.rows.len());
    let mut line = format!(
        "Showing {} {} groups ({} monsters after filters).",
        groups, query.dimension, matched
    );
    let top = table
        .and_then(|t| t.rows.first())
        .and_then(|row| Some((row.key.as_str(), row.values.first().copied().flatten()?)));
    if let Some((key, value)) = top {
        let shown = match query.metric {
            Metric::Count => format_number(value, 0),
            Metric::PctFly | Metric::PctSwim => format_percent(Some(value)),
            Metric::AvgCr | Metric::AvgHp | Metric::AvgAc => format_number(value, 2),
        };
        line.push_str(&format!(
            " Top group: {} ({}: {}).",
            key,
            query.metric.label(),
            shown
        ));
    }
    line
}

/// Smallest and largest parseable challenge rating, if any.
pub fn cr_range(rows: &[CanonicalRow]) -> Option<(f64, f64)> {
    rows.iter()
        .filter_map(CanonicalRow::cr_value)
        .fold(None, |acc, cr| match acc {
            None => Some((cr, cr)),
            Some((lo, hi)) => Some((lo.min(cr), hi.max(cr))),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
