//! Expansion of multi-habitat monsters into one row per environment.

use ecology_core::models::CanonicalRow;

/// A canonical row seen through exactly one of its environments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplodedRow<'a> {
    pub row: &'a CanonicalRow,
    pub environment: &'a str,
}

impl ExplodedRow<'_> {
    /// Owned single-environment copy of the underlying row.
    pub fn to_canonical(&self) -> CanonicalRow {
        CanonicalRow {
            environment: vec![self.environment.to_string()],
            ..self.row.clone()
        }
    }
}

/// One [`ExplodedRow`] per (row, non-blank environment) pair.
///
/// Output order is source row order, then environment-list order. Rows with
/// no usable environment are dropped.
pub fn explode(rows: &[CanonicalRow]) -> Vec<ExplodedRow<'_>> {
    rows.iter()
        .flat_map(|row| {
            row.environment
                .iter()
                .map(|env| env.trim())
                .filter(|env| !env.is_empty())
                .map(move |environment| ExplodedRow { row, environment })
        })
        .collect()
}
