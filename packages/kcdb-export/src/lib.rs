pub mod catalog;
pub mod client;
pub mod config;
pub mod csv_writer;
pub mod dedupe;
pub mod error;
pub mod flatten;
pub mod locate;
pub mod runner;
pub mod sweep;
pub mod types;

pub use client::{fetch_records, Fetch, HttpFetcher};
pub use config::{load_plan, Job, Plan, ScopedJob, Settings, SweepJob};
pub use csv_writer::{collect_columns, write_batch, write_records};
pub use dedupe::{dedup_key, dedupe};
pub use error::FetchError;
pub use flatten::{flatten_record, flatten_value};
pub use locate::{extract_records, find_record_list, locate_records};
pub use runner::Harvester;
pub use sweep::{sweep, SweepOptions, SweepOutcome};
pub use types::{Endpoint, ExportSummary, FetchRequest, FlatRow, Record};
