use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::StatusCode;

use crate::error::LoadError;
use crate::source::Fetch;

enum Stub {
    Text(String),
    Status(StatusCode),
    Failure(String),
}

/// In-memory content keyed by path, counting every fetch.
#[derive(Default)]
pub struct StubSource {
    entries: HashMap<String, Stub>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.entries.insert(path.to_string(), Stub::Text(text.to_string()));
        self
    }

    pub fn with_status(mut self, path: &str, status: StatusCode) -> Self {
        self.entries.insert(path.to_string(), Stub::Status(status));
        self
    }

    pub fn failing_with(mut self, path: &str, message: &str) -> Self {
        self.entries.insert(path.to_string(), Stub::Failure(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetch for StubSource {
    async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(path) {
            Some(Stub::Text(text)) => Ok(text.clone()),
            Some(Stub::Status(status)) => Err(LoadError::Status {
                path: path.to_string(),
                status: *status,
            }),
            Some(Stub::Failure(message)) => Err(LoadError::Io {
                path: path.to_string(),
                source: io::Error::other(message.clone()),
            }),
            None => Err(LoadError::Io {
                path: path.to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        }
    }
}
