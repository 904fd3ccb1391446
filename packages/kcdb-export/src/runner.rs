use crate::client::{fetch_records, Fetch};
use crate::config::{Job, Plan, ScopedJob, Settings, SweepJob};
use crate::csv_writer::write_batch;
use crate::dedupe::dedupe;
use crate::error::FetchError;
use crate::sweep::{sweep, SweepOptions, SweepOutcome};
use crate::types::{Endpoint, ExportSummary, FetchRequest, Record};
use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::thread;
use tracing::{info, info_span, warn};

/// Runs export jobs against a fetcher and writes CSV files under `out_dir`.
///
/// Request failures are logged and counted as zero records; only local
/// write failures are returned as errors.
pub struct Harvester<F: Fetch> {
    fetcher: F,
    settings: Settings,
}

impl<F: Fetch> Harvester<F> {
    pub fn new(fetcher: F, settings: Settings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        self.settings.out_dir.join(file_name)
    }

    fn write(&self, file_name: &str, records: &[Record]) -> Result<ExportSummary> {
        let path = self.output_path(file_name);
        let rows = write_batch(&path, records)?;
        Ok(ExportSummary { path, rows })
    }

    fn pause(&self, index: usize) {
        if index > 0 && !self.settings.delay.is_zero() {
            thread::sleep(self.settings.delay);
        }
    }

    fn fetch_logged(&self, request: &FetchRequest) -> Vec<Record> {
        match fetch_records(&self.fetcher, request) {
            Ok(records) => {
                info!(request = %request.describe(), records = records.len(), "Fetched records");
                records
            }
            Err(FetchError::Empty) => {
                warn!(request = %request.describe(), "No list of records found in response");
                Vec::new()
            }
            Err(e) => {
                warn!(request = %request.describe(), error = %e, "Fetch failed");
                Vec::new()
            }
        }
    }

    /// One `<name>.csv` per endpoint, no parameters.
    pub fn export_catalog(&self, endpoints: &[Endpoint]) -> Result<Vec<ExportSummary>> {
        let mut summaries = Vec::with_capacity(endpoints.len());

        for (i, endpoint) in endpoints.iter().enumerate() {
            self.pause(i);
            info!(endpoint = %endpoint.name, "Fetching reference list");
            let records = self.fetch_logged(&FetchRequest::new(endpoint.clone()));
            summaries.push(self.write(&format!("{}.csv", endpoint.name), &records)?);
        }

        Ok(summaries)
    }

    /// One file per scope value, then the deduplicated union of all of them.
    pub fn export_scoped(&self, job: &ScopedJob) -> Result<Vec<ExportSummary>> {
        let tag_field = format!("_{}", job.param);
        let mut summaries = Vec::new();
        let mut all_records = Vec::new();

        for (i, value) in job.values.iter().enumerate() {
            self.pause(i);
            info!(endpoint = %job.endpoint.name, param = %job.param, value = %value, "Fetching scope");

            let request = FetchRequest::new(job.endpoint.clone()).param(&job.param, value);
            let mut records = self.fetch_logged(&request);
            for record in records.iter_mut() {
                record.insert(tag_field.clone(), Value::from(value.as_str()));
            }

            let file_name = format!("{}_{}.csv", job.file_prefix, value);
            summaries.push(self.write(&file_name, &records)?);
            all_records.extend(records);
        }

        if let Some(combined) = &job.combined {
            let unique = dedupe(all_records);
            info!(
                endpoint = %job.endpoint.name,
                unique = unique.len(),
                "Merged scoped results"
            );
            summaries.push(self.write(combined, &unique)?);
        }

        Ok(summaries)
    }

    /// Sweeps the identifier range; writes per-identifier files when a prefix
    /// is configured and always the deduplicated combined file.
    pub fn export_sweep(&self, job: &SweepJob) -> Result<(SweepOutcome, Vec<ExportSummary>)> {
        let options = SweepOptions {
            tag_field: format!("_{}", job.param),
            delay: self.settings.delay,
        };

        let span = info_span!("sweep", endpoint = %job.endpoint.name, param = %job.param);
        let outcome = span.in_scope(|| {
            sweep(job.start..=job.end, &options, |id| {
                let request = FetchRequest::new(job.endpoint.clone()).param(&job.param, id);
                fetch_records(&self.fetcher, &request)
            })
        });

        let mut summaries = Vec::new();
        if let Some(prefix) = &job.file_prefix {
            for (id, records) in &outcome.batches {
                summaries.push(self.write(&format!("{}_{}.csv", prefix, id), records)?);
            }
        }

        if outcome.valid_ids.is_empty() {
            warn!(endpoint = %job.endpoint.name, param = %job.param, "No valid identifiers found");
        } else {
            info!(
                endpoint = %job.endpoint.name,
                param = %job.param,
                valid_ids = ?outcome.valid_ids,
                "Valid identifiers with data"
            );
        }

        let merged = outcome.merged();
        summaries.push(self.write(&job.combined, &merged)?);

        Ok((outcome, summaries))
    }

    pub fn run_job(&self, job: &Job) -> Result<Vec<ExportSummary>> {
        match job {
            Job::Catalog { endpoints } => self.export_catalog(endpoints),
            Job::Scoped(scoped) => self.export_scoped(scoped),
            Job::Sweep(sweep_job) => self.export_sweep(sweep_job).map(|(_, summaries)| summaries),
        }
    }

    /// Runs every job in order, stopping only on a write failure.
    pub fn run_plan(&self, plan: &Plan) -> Result<Vec<ExportSummary>> {
        let mut summaries = Vec::new();
        for (i, job) in plan.jobs.iter().enumerate() {
            info!(job = i + 1, total = plan.jobs.len(), "Running job");
            summaries.extend(self.run_job(job)?);
        }
        Ok(summaries)
    }
}
