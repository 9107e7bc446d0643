//! Publishing the formatted report.
//!
//! Every publisher writes with overwrite semantics: publishing to the same
//! destination twice leaves one artifact there, the newer one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DROPBOX_UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";

/// Why a publish did not happen. Never undoes local artifacts.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no credential configured for {publisher}")]
    MissingCredential { publisher: &'static str },

    #[error("{publisher} rejected the credential (HTTP {status})")]
    Unauthorized { publisher: &'static str, status: u16 },

    #[error("invalid destination '{0}'")]
    InvalidDestination(String),

    #[error("transfer to {destination} failed: {reason}")]
    Transfer { destination: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What the store reported for a completed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub destination: String,
    pub bytes: u64,
    /// Store-side revision id, when the store has one.
    pub revision: Option<String>,
}

/// Uploads a local file to a fixed destination, replacing what is there.
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    fn publish(&self, local: &Path, destination: &str) -> Result<PublishReceipt, PublishError>;
}

fn read_artifact(local: &Path) -> Result<Vec<u8>, PublishError> {
    std::fs::read(local).map_err(|source| PublishError::Io {
        path: local.to_path_buf(),
        source,
    })
}

// ─── Dropbox ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'a str,
    autorename: bool,
    mute: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    rev: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    path_display: Option<String>,
}

/// Dropbox `files/upload` with `mode: overwrite`.
///
/// The access token is passed in at construction; a `None` or blank token
/// fails every publish with [`PublishError::MissingCredential`] without
/// touching the network.
pub struct DropboxPublisher {
    client: reqwest::blocking::Client,
    token: Option<String>,
    upload_url: String,
}

impl std::fmt::Debug for DropboxPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropboxPublisher")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("upload_url", &self.upload_url)
            .finish()
    }
}

impl DropboxPublisher {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Transfer {
                destination: DROPBOX_UPLOAD_URL.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            upload_url: DROPBOX_UPLOAD_URL.to_string(),
        })
    }

    /// Point uploads at a different endpoint.
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    fn upload_arg(destination: &str) -> Result<String, PublishError> {
        serde_json::to_string(&UploadArg {
            path: destination,
            mode: "overwrite",
            autorename: false,
            mute: true,
        })
        .map_err(|e| PublishError::InvalidDestination(format!("{destination}: {e}")))
    }
}

impl Publisher for DropboxPublisher {
    fn name(&self) -> &'static str {
        "dropbox"
    }

    fn publish(&self, local: &Path, destination: &str) -> Result<PublishReceipt, PublishError> {
        let token = self.token.as_deref().ok_or(PublishError::MissingCredential {
            publisher: self.name(),
        })?;
        if !destination.starts_with('/') {
            return Err(PublishError::InvalidDestination(destination.to_string()));
        }

        let body = read_artifact(local)?;
        let bytes = body.len() as u64;
        let transfer = |reason: String| PublishError::Transfer {
            destination: destination.to_string(),
            reason,
        };

        tracing::debug!(destination, bytes, "uploading to dropbox");
        let resp = self
            .client
            .post(&self.upload_url)
            .bearer_auth(token)
            .header("Dropbox-API-Arg", Self::upload_arg(destination)?)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .map_err(|e| transfer(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PublishError::Unauthorized {
                publisher: self.name(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(transfer(format!("HTTP {status}: {}", detail.trim())));
        }

        let parsed: UploadResponse = resp
            .json()
            .map_err(|e| transfer(format!("unreadable upload response: {e}")))?;

        Ok(PublishReceipt {
            destination: parsed.path_display.unwrap_or_else(|| destination.to_string()),
            bytes: parsed.size.unwrap_or(bytes),
            revision: parsed.rev,
        })
    }
}

// ─── Local directory ────────────────────────────────────────────────

/// Copies into a local directory, mapping `/a/b.xlsx` to `<root>/a/b.xlsx`.
/// Used for dry runs and wherever no cloud credential is available.
#[derive(Debug, Clone)]
pub struct LocalDirPublisher {
    root: PathBuf,
}

impl LocalDirPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where `destination` lands under the root. Rejects empty and `..` paths.
    pub fn resolve(&self, destination: &str) -> Result<PathBuf, PublishError> {
        let relative = destination.trim_start_matches('/');
        let invalid = relative.is_empty()
            || relative
                .split('/')
                .any(|part| part.is_empty() || part == "." || part == "..");
        if invalid {
            return Err(PublishError::InvalidDestination(destination.to_string()));
        }
        Ok(relative.split('/').fold(self.root.clone(), |p, part| p.join(part)))
    }
}

impl Publisher for LocalDirPublisher {
    fn name(&self) -> &'static str {
        "local"
    }

    fn publish(&self, local: &Path, destination: &str) -> Result<PublishReceipt, PublishError> {
        let target = self.resolve(destination)?;
        let body = read_artifact(local)?;
        crate::artifacts::write_atomic(&target, &body).map_err(|source| PublishError::Io {
            path: target.clone(),
            source,
        })?;
        tracing::debug!(target = %target.display(), "copied report");
        Ok(PublishReceipt {
            destination: target.display().to_string(),
            bytes: body.len() as u64,
            revision: None,
        })
    }
}
