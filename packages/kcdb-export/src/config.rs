use crate::catalog;
use crate::types::Endpoint;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.bipm.org/api/kcdb";
pub const DEFAULT_OUT_DIR: &str = "api_data";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_ACCEPT: &str = "application/json, application/*+json";

/// Connection and output settings shared by every job
#[derive(Clone, Debug)]
pub struct Settings {
    pub base_url: String,
    pub out_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Pause between consecutive requests of one job
    pub delay: Duration,
    pub accept: String,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            accept: DEFAULT_ACCEPT.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("kcdb-export/{}", env!("CARGO_PKG_VERSION"))
}

/// Export every record of one endpoint per value of a query parameter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopedJob {
    pub endpoint: Endpoint,
    pub param: String,
    pub values: Vec<String>,
    /// Per-value files are named `<prefix>_<value>.csv`
    pub file_prefix: String,
    pub combined: Option<String>,
}

/// Sweep a numeric parameter over an inclusive range
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepJob {
    pub endpoint: Endpoint,
    pub param: String,
    pub start: u64,
    pub end: u64,
    /// Per-identifier files are only written when set
    pub file_prefix: Option<String>,
    pub combined: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Job {
    Catalog { endpoints: Vec<Endpoint> },
    Scoped(ScopedJob),
    Sweep(SweepJob),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub jobs: Vec<Job>,
}

// --- on-disk shape ---

#[derive(Debug, Deserialize)]
struct PlanFile {
    jobs: Vec<JobFile>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JobFile {
    Catalog {
        #[serde(default)]
        endpoints: Vec<String>,
    },
    Scoped {
        endpoint: String,
        param: String,
        values: Vec<ScopeValue>,
        file_prefix: Option<String>,
        combined: Option<String>,
    },
    Sweep {
        endpoint: String,
        param: String,
        start: u64,
        end: u64,
        file_prefix: Option<String>,
        combined: Option<String>,
    },
}

/// Scope values may be written as numbers or text in YAML
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScopeValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeValue::Int(i) => write!(f, "{}", i),
            ScopeValue::Text(s) => f.write_str(s),
        }
    }
}

/// Resolves an endpoint name through the catalog
pub fn resolve_endpoint(name: &str) -> Result<Endpoint> {
    catalog::lookup(name).with_context(|| format!("Unknown endpoint: {:?}", name))
}

pub fn default_combined_name(endpoint: &Endpoint, param: &str) -> String {
    format!("{}_{}.csv", endpoint.name, param)
}

impl ScopedJob {
    pub fn new(endpoint: Endpoint, param: impl Into<String>, values: Vec<String>) -> Self {
        let param = param.into();
        Self {
            file_prefix: endpoint.name.clone(),
            combined: Some(default_combined_name(&endpoint, &param)),
            endpoint,
            param,
            values,
        }
    }
}

impl SweepJob {
    pub fn new(endpoint: Endpoint, param: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        let param = param.into();
        if start > end {
            bail!("Sweep range is empty: start {} > end {}", start, end);
        }
        Ok(Self {
            combined: default_combined_name(&endpoint, &param),
            endpoint,
            param,
            start,
            end,
            file_prefix: None,
        })
    }
}

/// Parses a YAML plan and resolves every endpoint name
pub fn parse_plan(yaml: &str) -> Result<Plan> {
    let plan_file: PlanFile = serde_yaml::from_str(yaml).context("Failed to parse plan")?;

    let mut jobs = Vec::with_capacity(plan_file.jobs.len());
    for job in plan_file.jobs {
        let job = match job {
            JobFile::Catalog { endpoints } => {
                let endpoints = if endpoints.is_empty() {
                    catalog::all()
                } else {
                    endpoints
                        .iter()
                        .map(|name| resolve_endpoint(name))
                        .collect::<Result<Vec<_>>>()?
                };
                Job::Catalog { endpoints }
            }
            JobFile::Scoped {
                endpoint,
                param,
                values,
                file_prefix,
                combined,
            } => {
                let mut scoped = ScopedJob::new(
                    resolve_endpoint(&endpoint)?,
                    param,
                    values.iter().map(ToString::to_string).collect(),
                );
                if let Some(prefix) = file_prefix {
                    scoped.file_prefix = prefix;
                }
                if combined.is_some() {
                    scoped.combined = combined;
                }
                Job::Scoped(scoped)
            }
            JobFile::Sweep {
                endpoint,
                param,
                start,
                end,
                file_prefix,
                combined,
            } => {
                let mut sweep = SweepJob::new(resolve_endpoint(&endpoint)?, param, start, end)?;
                sweep.file_prefix = file_prefix;
                if let Some(name) = combined {
                    sweep.combined = name;
                }
                Job::Sweep(sweep)
            }
        };
        jobs.push(job);
    }

    Ok(Plan { jobs })
}

/// Load a plan from a YAML file
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<Plan> {
    let path = path.as_ref();

    let yaml = fs::read_to_string(path)
        .context(format!("Failed to read plan file: {:?}", path))?;

    parse_plan(&yaml).context(format!("Invalid plan file: {:?}", path))
}
