//! Shared helpers for kcdb-export integration tests
//!
//! Provides record builders, a scripted in-memory fetcher and a minimal HTTP
//! responder for exercising the real client.

#![allow(dead_code)]

use kcdb_export::{Endpoint, Fetch, FetchError, FetchRequest, Record, Settings};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Build a record from a `json!` object literal
pub fn rec(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn endpoint(name: &str) -> Endpoint {
    kcdb_export::catalog::lookup(name).expect("endpoint in catalog")
}

/// Settings writing into `out_dir` with no pause between requests
pub fn quiet_settings(out_dir: &std::path::Path) -> Settings {
    Settings {
        out_dir: out_dir.to_path_buf(),
        delay: Duration::ZERO,
        ..Settings::default()
    }
}

/// Fetcher answering from a table keyed by `FetchRequest::describe()`.
/// Unknown requests answer with HTTP 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Result<Value, FetchError>>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, request: &str, body: Value) -> Self {
        self.responses.insert(request.to_string(), Ok(body));
        self
    }

    pub fn fail(mut self, request: &str, error: FetchError) -> Self {
        self.responses.insert(request.to_string(), Err(error));
        self
    }
}

impl Fetch for ScriptedFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let key = request.describe();
        self.calls.borrow_mut().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or(Err(FetchError::HttpStatus { status: 404 }))
    }
}

/// A canned HTTP response
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: "error".to_string(),
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html",
            body: body.to_string(),
        }
    }
}

/// Local HTTP/1.1 responder; every raw request head is kept in `requests`.
pub struct TestServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// `handler` receives the request target (path and query) and picks a reply
    pub fn start<H>(handler: H) -> Self
    where
        H: Fn(&str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve_one(stream, &handler, &log);
            }
        });

        Self {
            base_url: format!("http://{}/api/kcdb", addr),
            requests,
        }
    }

    /// Accepts connections but never answers them
    pub fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("local addr");

        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                held.push(stream);
            }
        });

        Self {
            base_url: format!("http://{}/api/kcdb", addr),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Base URL of a port nothing listens on
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/api/kcdb", addr)
}

fn serve_one<H>(mut stream: TcpStream, handler: &H, log: &Arc<Mutex<Vec<String>>>)
where
    H: Fn(&str) -> Reply,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    log.lock().unwrap().push(head);

    let reply = handler(&target);
    let response = format!(
        "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.content_type,
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
