use crate::config::Settings;
use crate::error::FetchError;
use crate::locate::extract_records;
use crate::types::{FetchRequest, Record};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

/// Source of decoded response bodies
pub trait Fetch {
    fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        (**self).fetch(request)
    }
}

/// Blocking HTTP client against the API base URL
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&settings.accept)
                .context(format!("Invalid Accept header: {:?}", settings.accept))?,
        );

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, request: &FetchRequest) -> String {
        format!(
            "{}/{}",
            self.base_url,
            request.endpoint.path.trim_start_matches('/')
        )
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let url = self.url_for(request);
        debug!(url = %url, params = ?request.params, "Sending HTTP request");

        let response = self.client.get(&url).query(&request.params).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let body = response.text()?;

        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            content_type,
            reason: e.to_string(),
        })
    }
}

/// Fetches `request` and pulls the record list out of the body.
///
/// A body without any usable list is reported as [`FetchError::Empty`].
pub fn fetch_records<F: Fetch + ?Sized>(
    fetcher: &F,
    request: &FetchRequest,
) -> Result<Vec<Record>, FetchError> {
    let body = fetcher.fetch(request)?;
    let records = extract_records(&body, request.endpoint.list_key.as_deref());

    if records.is_empty() {
        let top_level: Vec<&str> = match &body {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        };
        debug!(
            request = %request.describe(),
            top_level_keys = ?top_level,
            "No list of records found in response"
        );
        return Err(FetchError::Empty);
    }

    Ok(records)
}
