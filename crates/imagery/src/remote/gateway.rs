use super::{Credentials, RemoteClient, RemoteError, StoreOptions};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// Auto-connecting wrapper around a [`RemoteClient`].
///
/// A call that fails with `NotConnected` triggers one `connect` followed by one
/// retry. Any other error, or a second failure, is returned as-is.
pub struct Gateway<C: RemoteClient> {
    client: C,
    credentials: Option<Credentials>,
}

impl<C: RemoteClient> Gateway<C> {
    /// Credentials are read from the environment when a connection is first needed.
    pub fn new(client: C) -> Self {
        Self {
            client,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(
        &self,
        key: &str,
        path: &Path,
        bucket: &str,
        options: &StoreOptions,
    ) -> Result<(), RemoteError> {
        let io_err = |e: std::io::Error| RemoteError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        let mut file = File::open(path).map_err(io_err)?;

        debug!(%key, %bucket, "remote store");
        self.execute(|| {
            file.seek(SeekFrom::Start(0)).map_err(io_err)?;
            self.client.store(key, &mut file, bucket, options)
        })
    }

    pub fn delete(&self, key: &str, bucket: &str) -> Result<(), RemoteError> {
        debug!(%key, %bucket, "remote delete");
        self.execute(|| self.client.delete(key, bucket))
    }

    fn execute<T, F>(&self, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Result<T, RemoteError>,
    {
        match op() {
            Err(RemoteError::NotConnected) => {
                warn!("remote store not connected; connecting and retrying");
                let credentials = match &self.credentials {
                    Some(credentials) => credentials.clone(),
                    None => Credentials::from_env()?,
                };
                self.client.connect(&credentials)?;
                op()
            }
            other => other,
        }
    }
}
