//! Accumulates normalized rows across paginated batches.

use ecology_core::models::{CanonicalRow, RawRecord};
use tracing::debug;

use crate::builder::build_rows;
use crate::exploder::{explode, ExplodedRow};

/// The assembled, read-only canonical dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<CanonicalRow>,
}

impl Dataset {
    pub fn new(rows: Vec<CanonicalRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Environment-conditioned view of the dataset.
    pub fn explode(&self) -> Vec<ExplodedRow<'_>> {
        explode(&self.rows)
    }
}

/// Concatenates row batches in arrival order. No deduplication is performed.
#[derive(Debug, Default)]
pub struct DatasetAssembler {
    rows: Vec<CanonicalRow>,
    batches: usize,
}

impl DatasetAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-built batch.
    pub fn add_batch(&mut self, rows: Vec<CanonicalRow>) {
        self.batches += 1;
        debug!(
            "batch {}: {} rows (total {})",
            self.batches,
            rows.len(),
            self.rows.len() + rows.len()
        );
        self.rows.extend(rows);
    }

    /// Build rows from raw records and append them as one batch.
    pub fn add_records(&mut self, records: &[RawRecord]) {
        self.add_batch(build_rows(records));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finalize(self) -> Dataset {
        Dataset::new(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assembler_concatenates_in_order() {
        let mut assembler = DatasetAssembler::new();
        assembler.add_records(&[json!({"name": "A"}), json!({"name": "B"})]);
        assembler.add_records(&[json!({"name": "C"})]);
        assert_eq!(assembler.len(), 3);

        let dataset = assembler.finalize();
        let names: Vec<&str> = dataset.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_assembler_keeps_duplicates() {
        let mut assembler = DatasetAssembler::new();
        assembler.add_records(&[json!({"name": "Goblin"})]);
        assembler.add_records(&[json!({"name": "Goblin"})]);
        assert_eq!(assembler.finalize().len(), 2);
    }

    #[test]
    fn test_assembler_empty_batches() {
        let mut assembler = DatasetAssembler::new();
        assembler.add_batch(Vec::new());
        assert!(assembler.is_empty());
        assert!(assembler.finalize().is_empty());
    }

    #[test]
    fn test_dataset_explode() {
        let mut assembler = DatasetAssembler::new();
        assembler.add_records(&[
            json!({"name": "A", "environments": ["Forest", "Swamp"]}),
            json!({"name": "B", "environments": []}),
        ]);
        let dataset = assembler.finalize();
        assert_eq!(dataset.explode().len(), 2);
    }
}
