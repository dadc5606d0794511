//! Reqwest-backed storage collaborator.
//!
//! # Design
//!
//! - One `reqwest::Client` per daemon; the bearer token lives behind an
//!   `RwLock` so `login` can refresh the session without rebuilding the
//!   client.
//! - Unary calls carry a per-request timeout; the notification stream does
//!   not, since it stays open for as long as the cluster is quiet.
//! - Notifications arrive as newline-delimited JSON; a line that fails to
//!   parse is logged and skipped rather than faulting the stream.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use lockwarden_core::error::StorageError;
use lockwarden_core::retention::format_retention;
use lockwarden_core::storage::{ChangeStream, EventKind, FileAttributes, FileRef, StorageApi};

/// Default per-request timeout for unary calls.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the REST client.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Base URL of the cluster API (scheme, host, port).
    pub base_url: Url,
    /// Session username.
    pub username: String,
    /// Session secret.
    pub password: String,
    /// Accept self-signed cluster certificates.
    pub accept_invalid_certs: bool,
    /// Timeout applied to unary requests.
    pub request_timeout: Duration,
}

impl RestClientConfig {
    /// Build settings for an HTTPS cluster endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Protocol`] when host and port do not form a
    /// valid URL.
    pub fn for_host(
        host: &str,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_url = format!("https://{host}:{port}")
            .parse()
            .map_err(|err| StorageError::Protocol {
                operation: "client.base_url",
                detail: format!("invalid cluster endpoint: {err}"),
            })?;
        Ok(Self {
            base_url,
            username: username.into(),
            password: password.into(),
            accept_invalid_certs: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    bearer_token: String,
}

#[derive(Serialize)]
struct LockRequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    retention_period: Option<String>,
    legal_hold: bool,
}

/// REST implementation of the storage collaborator contracts.
pub struct RestStorageClient {
    http: Client,
    config: RestClientConfig,
    token: RwLock<Option<String>>,
}

impl RestStorageClient {
    /// Construct a client; no connection is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transport`] when the underlying HTTP client
    /// cannot be built.
    pub fn new(config: RestClientConfig) -> Result<Self, StorageError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| StorageError::Transport {
                operation: "client.build",
                detail: err.to_string(),
            })?;
        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, reference: &FileRef, trailing: &str) -> Result<Url, StorageError> {
        let mut url = self.config.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| StorageError::Protocol {
                operation: "client.endpoint",
                detail: "cluster endpoint cannot carry paths".to_owned(),
            })?;
            segments.extend(["v1", "files"]);
            match reference {
                FileRef::Id(id) => segments.push(id),
                FileRef::Path(path) => segments.push(path),
            };
            segments.push(trailing);
        }
        Ok(url)
    }

    /// Current bearer token, logging in first if no session exists.
    async fn bearer(&self) -> Result<String, StorageError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.login().await?;
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| StorageError::Auth {
                detail: "login completed without a session token".to_owned(),
            })
    }

    fn classify(
        operation: &'static str,
        reference: Option<&FileRef>,
        status: StatusCode,
    ) -> StorageError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return StorageError::Auth {
                detail: format!("cluster rejected credentials with status {status}"),
            };
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(reference) = reference {
                return StorageError::NotFound {
                    reference: reference.to_string(),
                };
            }
        }
        StorageError::Status {
            operation,
            status: status.as_u16(),
        }
    }
}

#[async_trait]
impl StorageApi for RestStorageClient {
    async fn login(&self) -> Result<(), StorageError> {
        let url = self
            .config
            .base_url
            .join("v1/session/login")
            .map_err(|err| StorageError::Protocol {
                operation: "session.login",
                detail: err.to_string(),
            })?;
        let response = self
            .http
            .post(url)
            .timeout(self.config.request_timeout)
            .json(&LoginRequest {
                username: &self.config.username,
                password: &self.config.password,
            })
            .send()
            .await
            .map_err(|err| StorageError::Transport {
                operation: "session.login",
                detail: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify("session.login", None, status));
        }
        let payload: LoginResponse =
            response.json().await.map_err(|err| StorageError::Protocol {
                operation: "session.login",
                detail: err.to_string(),
            })?;
        *self.token.write().await = Some(payload.bearer_token);
        debug!("session established");
        Ok(())
    }

    async fn get_attributes(&self, reference: &FileRef) -> Result<FileAttributes, StorageError> {
        let url = self.endpoint(reference, "attributes")?;
        let token = self.bearer().await?;
        let response = self
            .http
            .get(url)
            .timeout(self.config.request_timeout)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| StorageError::Transport {
                operation: "files.attributes",
                detail: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify("files.attributes", Some(reference), status));
        }
        response.json().await.map_err(|err| StorageError::Protocol {
            operation: "files.attributes",
            detail: err.to_string(),
        })
    }

    async fn open_change_stream(
        &self,
        root: &FileRef,
        recursive: bool,
        kinds: &[EventKind],
    ) -> Result<Box<dyn ChangeStream>, StorageError> {
        let mut url = self.endpoint(root, "notify")?;
        let filter = kinds
            .iter()
            .map(|kind| kind.wire_name())
            .collect::<Vec<_>>()
            .join(",");
        url.query_pairs_mut()
            .append_pair("recursive", if recursive { "true" } else { "false" })
            .append_pair("filter", &filter);

        let token = self.bearer().await?;
        // No request timeout: the stream stays open while the cluster is quiet.
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| StorageError::Transport {
                operation: "files.notify",
                detail: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify("files.notify", Some(root), status));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(Box::new(RestChangeStream {
            body,
            buffer: Vec::new(),
        }))
    }

    async fn apply_lock(
        &self,
        path: &str,
        retention: Option<DateTime<Utc>>,
        legal_hold: bool,
    ) -> Result<(), StorageError> {
        let reference = FileRef::Path(path.to_owned());
        let url = self.endpoint(&reference, "lock")?;
        let token = self.bearer().await?;
        let response = self
            .http
            .put(url)
            .timeout(self.config.request_timeout)
            .bearer_auth(token)
            .json(&LockRequestBody {
                retention_period: retention.map(format_retention),
                legal_hold,
            })
            .send()
            .await
            .map_err(|err| StorageError::Transport {
                operation: "files.lock",
                detail: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify("files.lock", Some(&reference), status));
        }
        Ok(())
    }
}

/// Newline-delimited JSON reader over the notification response body.
struct RestChangeStream {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
}

impl RestChangeStream {
    /// Extract the next complete line from the buffer, if any.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let position = self.buffer.iter().position(|byte| *byte == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=position).collect();
        line.pop();
        Some(line)
    }

    fn parse_line(line: &[u8]) -> Option<Vec<serde_json::Value>> {
        let text = String::from_utf8_lossy(line);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Array(items)) => Some(items),
            Ok(other) => Some(vec![other]),
            Err(err) => {
                warn!(error = %err, "skipping undecodable notification line");
                None
            }
        }
    }
}

#[async_trait]
impl ChangeStream for RestChangeStream {
    async fn next_batch(&mut self) -> Result<Option<Vec<serde_json::Value>>, StorageError> {
        loop {
            while let Some(line) = self.take_line() {
                if let Some(batch) = Self::parse_line(&line) {
                    return Ok(Some(batch));
                }
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    return Err(StorageError::Transport {
                        operation: "files.notify",
                        detail: err.to_string(),
                    });
                }
                None => {
                    let residue = std::mem::take(&mut self.buffer);
                    return Ok(Self::parse_line(&residue));
                }
            }
        }
    }
}
