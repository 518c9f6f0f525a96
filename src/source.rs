use std::future::Future;
use std::path::{Component, Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::fs;
use tracing::debug;

use crate::error::LoadError;

// Characters that cannot appear raw in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The "fetch" capability every page component loads its resources through.
///
/// Paths are relative to the content root and use `/` separators.
pub trait Fetch: Sync {
    fn fetch_text(&self, path: &str) -> impl Future<Output = Result<String, LoadError>> + Send;
}

/// Accept only plain relative paths that stay inside the content root.
pub fn validate_path(path: &str) -> Result<&str, LoadError> {
    let invalid = || LoadError::InvalidPath(path.to_string());

    if path.is_empty() || path.contains('\\') || path.contains('\0') {
        return Err(invalid());
    }
    let all_normal = Path::new(path)
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !all_normal {
        return Err(invalid());
    }
    Ok(path)
}

fn decode(path: &str, bytes: Vec<u8>) -> Result<String, LoadError> {
    String::from_utf8(bytes).map_err(|e| LoadError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Content read from a directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFiles {
    root: PathBuf,
}

impl LocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for LocalFiles {
    async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
        let relative = validate_path(path)?;
        let full_path = self.root.join(relative);
        debug!(path = %full_path.display(), "reading content file");

        let bytes = fs::read(&full_path).await.map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        decode(path, bytes)
    }
}

/// Content fetched over HTTP from a base URL, e.g. a static file host.
#[derive(Debug, Clone)]
pub struct RemoteFiles {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteFiles {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();
        format!("{}{}", self.base_url, encoded.join("/"))
    }
}

impl Fetch for RemoteFiles {
    async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
        let relative = validate_path(path)?;
        let url = self.url_for(relative);
        debug!(%url, "fetching remote content");

        let request_error = |source| LoadError::Request {
            path: path.to_string(),
            source,
        };
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                path: path.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        decode(path, bytes.to_vec())
    }
}

/// The source the running site was configured with.
#[derive(Debug, Clone)]
pub enum ContentSource {
    Local(LocalFiles),
    Remote(RemoteFiles),
}

impl Fetch for ContentSource {
    async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
        match self {
            ContentSource::Local(files) => files.fetch_text(path).await,
            ContentSource::Remote(files) => files.fetch_text(path).await,
        }
    }
}
