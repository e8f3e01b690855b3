//! # Remote Replication
//!
//! Mirrors every local artifact into an S3-style bucket. Keys reuse the local
//! layout one-to-one:
//!
//! ```text
//! <prefix>/<identity>/<variant>.<ext>     e.g. avatar/1001/small.jpg
//! ```
//!
//! ## Pieces
//!
//! - [`RemoteClient`]: the raw store/delete/connect calls. Implement this over
//!   whatever SDK the deployment uses. [`MemRemote`] is the in-memory sandbox.
//! - [`Gateway`]: wraps a client and transparently connects and retries once when
//!   a call fails with [`RemoteError::NotConnected`].
//! - [`RemoteOverlay`]: a [`Storage`](crate::store::Storage) that runs the local
//!   pipeline and keeps the bucket in lockstep with it.
//!
//! ## Ordering
//!
//! On an identity change the old keys are deleted at the moment the old local
//! directory is removed, before anything is written under the new identity. After
//! the local save completes, every produced artifact is uploaded. There is no
//! rollback across the two stores: a failure part-way leaves whatever already
//! happened in place and surfaces the error.
//!
//! ## URLs
//!
//! With a distribution domain (a CDN in front of the bucket) URLs are
//! `<domain>/<prefix>/<identity>/<file>`; otherwise `<host>/<bucket>/<prefix>/...`.

use std::fmt;
use std::io::Read;
use thiserror::Error;

mod gateway;
mod memory;
mod overlay;

pub use gateway::Gateway;
pub use memory::{MemRemote, RemoteCommand, StoredObject};
pub use overlay::{remote_key, RemoteOverlay};

pub const DEFAULT_HOST: &str = "http://s3.amazonaws.com";

pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Ten years. Artifacts under an identity never change meaning, only get deleted.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=315360000";

pub const ACCESS_KEY_VAR: &str = "AMAZON_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AMAZON_SECRET_ACCESS_KEY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No connection has been established yet (or it was dropped).
    #[error("Not connected to the remote store")]
    NotConnected,

    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed for {bucket}/{key}: {message}")]
    Request {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("I/O error for {path}: {message}")]
    Io { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Private,
    PublicRead,
}

impl Access {
    /// Canned ACL name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::PublicRead => "public-read",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub access: Access,
    pub content_type: String,
    pub cache_control: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            access: Access::PublicRead,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
        }
    }

    /// Reads `AMAZON_ACCESS_KEY_ID` and `AMAZON_SECRET_ACCESS_KEY`.
    pub fn from_env() -> Result<Self, RemoteError> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| RemoteError::MissingCredentials(var.to_string()))
        };
        Ok(Self {
            access_key_id: read(ACCESS_KEY_VAR)?,
            secret_access_key: read(SECRET_KEY_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Where replicated artifacts live and how their URLs are formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub bucket: String,
    pub host: String,
    pub distribution_domain: Option<String>,
}

impl RemoteConfig {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            host: DEFAULT_HOST.to_string(),
            distribution_domain: None,
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_distribution_domain(mut self, domain: &str) -> Self {
        self.distribution_domain = Some(domain.trim_end_matches('/').to_string());
        self
    }

    /// Prepends the public origin to a `/prefix/identity/file` path.
    pub fn url_for(&self, path: &str) -> String {
        match &self.distribution_domain {
            Some(domain) => format!("{}{}", domain, path),
            None => format!("{}/{}{}", self.host, self.bucket, path),
        }
    }
}

/// Raw remote store operations.
///
/// Methods take `&self`; clients that track connection state use interior
/// mutability. Every call may fail with [`RemoteError::NotConnected`].
pub trait RemoteClient {
    fn store(
        &self,
        key: &str,
        body: &mut dyn Read,
        bucket: &str,
        options: &StoreOptions,
    ) -> Result<(), RemoteError>;

    fn delete(&self, key: &str, bucket: &str) -> Result<(), RemoteError>;

    fn connect(&self, credentials: &Credentials) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_with_default_host() {
        let config = RemoteConfig::new("cdn.site.com");
        assert_eq!(
            config.url_for("/missing/avatar/original.jpg"),
            "http://s3.amazonaws.com/cdn.site.com/missing/avatar/original.jpg"
        );
    }

    #[test]
    fn url_with_host_override() {
        let config = RemoteConfig::new("cdn.site.com").with_host("https://foo.com/");
        assert_eq!(
            config.url_for("/missing/avatar/original.jpg"),
            "https://foo.com/cdn.site.com/missing/avatar/original.jpg"
        );
    }

    #[test]
    fn url_with_distribution_domain() {
        let config =
            RemoteConfig::new("cdn.site.com").with_distribution_domain("https://cdn.site.com");
        assert_eq!(
            config.url_for("/avatar/1001/original.jpg"),
            "https://cdn.site.com/avatar/1001/original.jpg"
        );
    }

    #[test]
    fn default_store_options() {
        let options = StoreOptions::default();
        assert_eq!(options.access, Access::PublicRead);
        assert_eq!(options.access.as_str(), "public-read");
        assert_eq!(options.content_type, "image/jpeg");
        assert_eq!(options.cache_control, "max-age=315360000");
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = Credentials::new("AKIA", "s3cr3t");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("AKIA"));
        assert!(!shown.contains("s3cr3t"));
    }
}
