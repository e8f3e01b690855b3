use super::{Credentials, RemoteClient, RemoteError, StoreOptions};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// A completed remote call, as recorded by [`MemRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    Connect,
    Store { key: String, bucket: String },
    Delete { key: String, bucket: String },
}

impl RemoteCommand {
    pub fn store(key: &str, bucket: &str) -> Self {
        RemoteCommand::Store {
            key: key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn delete(key: &str, bucket: &str) -> Self {
        RemoteCommand::Delete {
            key: key.to_string(),
            bucket: bucket.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub options: StoreOptions,
}

/// In-memory remote store for testing.
///
/// Uses `RefCell` for interior mutability since the pipeline is single-threaded.
/// Only calls that succeed are recorded in [`MemRemote::commands`].
#[derive(Default)]
pub struct MemRemote {
    connected: RefCell<Option<Credentials>>,
    objects: RefCell<HashMap<(String, String), StoredObject>>,
    commands: RefCell<Vec<RemoteCommand>>,
    failing_keys: HashSet<String>,
    refuse_connections: bool,
}

impl MemRemote {
    /// A store that behaves as if a connection already exists.
    pub fn new() -> Self {
        let remote = Self::default();
        *remote.connected.borrow_mut() = Some(Credentials::new("", ""));
        remote
    }

    /// A store that answers `NotConnected` until `connect` is called.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Every request for `key` fails with a `Request` error.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Drops the connection, as a server-side timeout would.
    pub fn disconnect(&self) {
        *self.connected.borrow_mut() = None;
    }

    pub fn connected_with(&self) -> Option<Credentials> {
        self.connected.borrow().clone()
    }

    pub fn commands(&self) -> Vec<RemoteCommand> {
        self.commands.borrow().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .borrow()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys present in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .borrow()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    fn check(&self, key: &str, bucket: &str) -> Result<(), RemoteError> {
        if self.connected.borrow().is_none() {
            return Err(RemoteError::NotConnected);
        }
        if self.failing_keys.contains(key) {
            return Err(RemoteError::Request {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "Simulated request failure".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteClient for MemRemote {
    fn store(
        &self,
        key: &str,
        body: &mut dyn Read,
        bucket: &str,
        options: &StoreOptions,
    ) -> Result<(), RemoteError> {
        self.check(key, bucket)?;

        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes).map_err(|e| RemoteError::Io {
            path: key.to_string(),
            message: e.to_string(),
        })?;

        self.objects.borrow_mut().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: bytes,
                options: options.clone(),
            },
        );
        self.commands
            .borrow_mut()
            .push(RemoteCommand::store(key, bucket));
        Ok(())
    }

    fn delete(&self, key: &str, bucket: &str) -> Result<(), RemoteError> {
        self.check(key, bucket)?;
        self.objects
            .borrow_mut()
            .remove(&(bucket.to_string(), key.to_string()));
        self.commands
            .borrow_mut()
            .push(RemoteCommand::delete(key, bucket));
        Ok(())
    }

    fn connect(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        if self.refuse_connections {
            return Err(RemoteError::Connection(
                "Simulated connection refusal".to_string(),
            ));
        }
        *self.connected.borrow_mut() = Some(credentials.clone());
        self.commands.borrow_mut().push(RemoteCommand::Connect);
        Ok(())
    }
}
