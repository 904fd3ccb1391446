use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// One structured record as returned by the API
pub type Record = Map<String, Value>;

/// A record reduced to text cells, keyed by column name in output order
pub type FlatRow = IndexMap<String, String>;

/// A reference-data endpoint below the API base URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub path: String, // e.g. "referenceData/branch"
    /// Key that usually holds the record list, searched before the rest of the body
    pub list_key: Option<String>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, path: impl Into<String>, list_key: Option<&str>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            list_key: list_key.map(str::to_string),
        }
    }
}

/// A single GET against an endpoint
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub endpoint: Endpoint,
    pub params: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Short label for log lines, e.g. `referenceData/branch?areaId=3`
    pub fn describe(&self) -> String {
        if self.params.is_empty() {
            return self.endpoint.path.clone();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.endpoint.path, query.join("&"))
    }
}

/// Result of writing one CSV file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}
