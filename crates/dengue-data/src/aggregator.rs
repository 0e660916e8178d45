//! Folding projected rows into the aggregate tree.

use dengue_core::models::{AggregateTree, Frequency, PeriodEntry};
use tracing::debug;

use crate::fields::{classify_row, ParsedRecord, RowOutcome};

// ── AggregationStats ──────────────────────────────────────────────────────────

/// Row and entry counters accumulated across files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub rows_accepted: u64,
    pub rows_rejected: u64,
    pub entries: u64,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Owns the tree being built for one run.
#[derive(Debug, Default)]
pub struct Aggregator {
    tree: AggregateTree,
    stats: AggregationStats,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every record of one file under its year and frequency.
    pub fn add_records(&mut self, year: &str, frequency: Frequency, records: &[ParsedRecord]) {
        for record in records {
            self.add_record(year, frequency, record);
        }
    }

    /// Append one [`PeriodEntry`] per period column of `record`.
    ///
    /// Rows without a municipality are dropped. Repeated periods are not
    /// merged; each appearance becomes its own entry.
    pub fn add_record(
        &mut self,
        year: &str,
        frequency: Frequency,
        record: &ParsedRecord,
    ) -> RowOutcome {
        let outcome = classify_row(record);
        let identity = match &outcome {
            RowOutcome::Accepted(identity) => identity,
            RowOutcome::Rejected { matched_key } => {
                debug!(?matched_key, "Ignoring row without municipality");
                self.stats.rows_rejected += 1;
                return outcome;
            }
        };

        for field in record.periods() {
            let entry = PeriodEntry::new(
                field.column.clone(),
                parse_cases(&field.value),
                identity.code.clone(),
            );
            self.tree
                .push(year, &identity.municipality, frequency, entry);
            self.stats.entries += 1;
        }
        self.stats.rows_accepted += 1;

        outcome
    }

    pub fn stats(&self) -> AggregationStats {
        self.stats
    }

    pub fn tree(&self) -> &AggregateTree {
        &self.tree
    }

    pub fn finish(self) -> (AggregateTree, AggregationStats) {
        (self.tree, self.stats)
    }
}

/// Integer case count; anything unparsable counts as zero.
pub fn parse_cases(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
