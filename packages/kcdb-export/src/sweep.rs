use crate::dedupe::dedupe;
use crate::error::FetchError;
use crate::types::Record;
use serde_json::Value;
use std::ops::RangeInclusive;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a sweep tags records and paces requests
#[derive(Clone, Debug)]
pub struct SweepOptions {
    /// Field added to every record, holding the identifier that produced it
    pub tag_field: String,
    /// Minimum pause between two consecutive requests
    pub delay: Duration,
}

/// Everything a sweep found
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Identifiers that returned at least one record, ascending
    pub valid_ids: Vec<u64>,
    /// Tagged records per valid identifier, ascending
    pub batches: Vec<(u64, Vec<Record>)>,
    pub failures: Vec<(u64, FetchError)>,
}

impl SweepOutcome {
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(|(_, records)| records.len()).sum()
    }

    /// All batches concatenated in identifier order, with content-identical
    /// records collapsed to their first occurrence.
    pub fn merged(&self) -> Vec<Record> {
        let all: Vec<Record> = self
            .batches
            .iter()
            .flat_map(|(_, records)| records.iter().cloned())
            .collect();
        dedupe(all)
    }
}

/// Requests every identifier in `ids` with `fetch`, ascending.
///
/// A failed or empty identifier is logged and skipped; the sweep always runs
/// to the end of the range. Nothing is retried.
pub fn sweep<F>(ids: RangeInclusive<u64>, options: &SweepOptions, mut fetch: F) -> SweepOutcome
where
    F: FnMut(u64) -> Result<Vec<Record>, FetchError>,
{
    let mut outcome = SweepOutcome::default();
    let (start, end) = (*ids.start(), *ids.end());

    info!(start, end, tag = %options.tag_field, "Starting identifier sweep");

    for id in ids {
        if id != start && !options.delay.is_zero() {
            thread::sleep(options.delay);
        }

        match fetch(id) {
            Ok(mut records) if !records.is_empty() => {
                for record in records.iter_mut() {
                    record.insert(options.tag_field.clone(), Value::from(id));
                }
                info!(id, records = records.len(), "Found records");
                outcome.valid_ids.push(id);
                outcome.batches.push((id, records));
            }
            Ok(_) => {
                debug!(id, "No data");
            }
            Err(FetchError::Empty) => {
                debug!(id, "No data");
            }
            Err(e) => {
                warn!(id, error = %e, "Fetch failed, skipping identifier");
                outcome.failures.push((id, e));
            }
        }
    }

    info!(
        valid = outcome.valid_ids.len(),
        records = outcome.record_count(),
        failures = outcome.failures.len(),
        "Sweep finished"
    );

    outcome
}
