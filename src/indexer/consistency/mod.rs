// Consistency validation between the record store and the vector index
// Divergence is reported; nothing is repaired automatically

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::database::VectorIndex;
use crate::documents::{ChunkRecord, RecordStore};

/// Consistency check results between the record store and the vector index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsistencyReport {
    /// Number of records in the record store
    pub stored_records: usize,
    /// Number of rows in the vector index
    pub indexed_vectors: usize,
    /// Record ids present in the store but not in the index
    pub missing_in_index: Vec<String>,
    /// Record ids present in the index but not in the store
    pub orphaned_in_index: Vec<String>,
    /// Record ids occupying more than one index row
    pub duplicated_in_index: Vec<String>,
    /// Record ids whose stored text no longer matches the indexed text
    pub stale_in_index: Vec<String>,
    /// Sources whose chunk counts differ between the two sides
    pub inconsistent_sources: Vec<SourceConsistencyIssue>,
    /// Overall consistency status
    pub is_consistent: bool,
}

/// Per-source chunk count mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConsistencyIssue {
    pub source: String,
    pub stored_records: usize,
    pub indexed_vectors: usize,
}

/// Compare the record store against the vector index.
///
/// Records are matched by id. Rows without an id are counted but can only
/// surface through the per-source counts.
#[inline]
pub fn check(records: &RecordStore, index: &VectorIndex) -> ConsistencyReport {
    debug!(
        "Checking consistency: {} stored records, {} indexed vectors",
        records.len(),
        index.len()
    );

    let stored: BTreeMap<&str, &ChunkRecord> = records
        .list()
        .into_iter()
        .map(|record| (record.id.as_str(), record))
        .collect();

    let indexed_ids: BTreeSet<&str> = index
        .records()
        .iter()
        .filter(|record| record.has_id())
        .map(|record| record.id.as_str())
        .collect();

    let missing_in_index: Vec<String> = stored
        .keys()
        .filter(|id| !indexed_ids.contains(*id))
        .map(|id| (*id).to_string())
        .collect();

    let orphaned_in_index: Vec<String> = indexed_ids
        .iter()
        .filter(|id| !stored.contains_key(*id))
        .map(|id| (*id).to_string())
        .collect();

    let duplicated_in_index: Vec<String> = index
        .records()
        .iter()
        .filter(|record| record.has_id())
        .map(|record| record.id.as_str())
        .duplicates()
        .sorted()
        .map(str::to_string)
        .collect();

    let stale_in_index: Vec<String> = index
        .records()
        .iter()
        .filter(|record| {
            stored
                .get(record.id.as_str())
                .is_some_and(|stored| stored.text != record.text)
        })
        .map(|record| record.id.clone())
        .unique()
        .collect();

    let inconsistent_sources = compare_sources(records, index);

    let is_consistent = missing_in_index.is_empty()
        && orphaned_in_index.is_empty()
        && duplicated_in_index.is_empty()
        && stale_in_index.is_empty()
        && inconsistent_sources.is_empty()
        && records.len() == index.len();

    let report = ConsistencyReport {
        stored_records: records.len(),
        indexed_vectors: index.len(),
        missing_in_index,
        orphaned_in_index,
        duplicated_in_index,
        stale_in_index,
        inconsistent_sources,
        is_consistent,
    };

    if report.is_consistent {
        info!("Consistency check passed");
    } else {
        warn!("Consistency check found issues: {}", report.summary());
        log_consistency_issues(&report);
    }

    report
}

fn compare_sources(records: &RecordStore, index: &VectorIndex) -> Vec<SourceConsistencyIssue> {
    let stored_counts = records.count_by_source();
    let indexed_counts = index.records().iter().counts_by(|record| record.source.as_str());

    stored_counts
        .keys()
        .map(String::as_str)
        .chain(indexed_counts.keys().copied())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .filter_map(|source| {
            let stored_records = stored_counts.get(source).copied().unwrap_or(0);
            let indexed_vectors = indexed_counts.get(source).copied().unwrap_or(0);
            (stored_records != indexed_vectors).then(|| SourceConsistencyIssue {
                source: source.to_string(),
                stored_records,
                indexed_vectors,
            })
        })
        .collect()
}

fn log_consistency_issues(report: &ConsistencyReport) {
    for id in report.missing_in_index.iter().take(10) {
        debug!("Missing in index: {}", id);
    }
    for id in report.orphaned_in_index.iter().take(10) {
        debug!("Orphaned in index: {}", id);
    }
    for id in &report.duplicated_in_index {
        debug!("Duplicated in index: {}", id);
    }
    for issue in &report.inconsistent_sources {
        warn!(
            "Source '{}': {} stored records, {} indexed vectors",
            issue.source, issue.stored_records, issue.indexed_vectors
        );
    }
}

impl ConsistencyReport {
    /// Get a summary string of the consistency report
    #[inline]
    pub fn summary(&self) -> String {
        if self.is_consistent {
            format!(
                "Stores are consistent: {} stored records, {} indexed vectors",
                self.stored_records, self.indexed_vectors
            )
        } else {
            format!(
                "Store inconsistencies found: {} missing in index, {} orphaned in index, {} duplicated in index, {} stale in index, {} sources with issues",
                self.missing_in_index.len(),
                self.orphaned_in_index.len(),
                self.duplicated_in_index.len(),
                self.stale_in_index.len(),
                self.inconsistent_sources.len()
            )
        }
    }

    /// Get the total number of consistency issues
    #[inline]
    pub fn total_issues(&self) -> usize {
        self.missing_in_index.len()
            + self.orphaned_in_index.len()
            + self.duplicated_in_index.len()
            + self.stale_in_index.len()
    }
}
