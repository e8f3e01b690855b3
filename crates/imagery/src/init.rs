//! # Context
//!
//! [`initialize`] turns a working directory plus an optional config path into an
//! [`ImageryContext`]: the loaded configuration, the artifact store, the converter
//! and the mode gate every storage built from it shares.
//!
//! [`ImageryContext::resource`] assembles the storage stack for one prefix:
//!
//! ```text
//! Faked(Resource)                        resource(..)
//! Faked(RemoteOverlay(Resource))         remote_resource(.., client)
//! ```
//!
//! The library ships no network client. A deployment that replicates implements
//! [`RemoteClient`] and hands it to [`ImageryContext::remote_resource`].

use crate::config::ImageryConfig;
use crate::converter::GmConverter;
use crate::error::{ImageryError, Result};
use crate::mode::{Faked, Mode, ModeGate};
use crate::remote::{Gateway, RemoteClient, RemoteOverlay};
use crate::resource::Resource;
use crate::store::fs::ArtifactStore;
use crate::store::Storage;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ImageryContext {
    pub config: ImageryConfig,
    pub store: ArtifactStore,
    pub converter: GmConverter,
    pub gate: ModeGate,
}

/// Options that override configuration for one invocation.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub fake: bool,
}

pub fn initialize(cwd: &Path, overrides: Overrides) -> Result<ImageryContext> {
    let config = ImageryConfig::load(overrides.config_file.as_deref(), cwd)?;
    Ok(ImageryContext::new(config, cwd, overrides))
}

impl ImageryContext {
    /// Builds a context from an already loaded configuration.
    /// `overrides.config_file` is not read here.
    pub fn new(config: ImageryConfig, cwd: &Path, overrides: Overrides) -> Self {
        let mut store = config.artifact_store(cwd);
        if let Some(root) = overrides.root {
            let root = if root.is_absolute() { root } else { cwd.join(root) };
            store = ArtifactStore::new(root).with_ext(&config.storage.ext);
        }

        let gate = ModeGate::new();
        if overrides.fake {
            gate.set_mode(Mode::Fake);
        }

        debug!(root = %store.root().display(), ext = %store.ext(), mode = ?gate.mode(), "initialized context");
        ImageryContext {
            converter: config.gm_converter(),
            config,
            store,
            gate,
        }
    }
}

impl ImageryContext {
    /// The local resource for `prefix`, carrying its configured variants.
    pub fn local_resource(&self, prefix: &str, identity: Option<&str>) -> Result<Resource> {
        Resource::new(prefix, self.store.clone(), self.converter.clone())?
            .with_variants(self.config.profile(prefix))?
            .with_identity(identity)
    }

    /// The gated storage for `prefix`. Local only.
    pub fn resource(&self, prefix: &str, identity: Option<&str>) -> Result<Box<dyn Storage>> {
        let local = self.local_resource(prefix, identity)?;
        Ok(Box::new(Faked::new(local, self.gate.clone())))
    }

    /// Where `variant` is served from: the bucket (or its distribution domain) when
    /// one is configured, the local URL path otherwise.
    pub fn public_url(&self, prefix: &str, identity: Option<&str>, variant: &str) -> Result<String> {
        let local = self.local_resource(prefix, identity)?;
        let path = local.url_path(variant);
        Ok(match self.config.remote_config() {
            Some(remote) => remote.url_for(&path),
            None => path,
        })
    }

    /// The gated storage for `prefix`, replicated through `client` to the
    /// configured bucket.
    pub fn remote_resource<C>(
        &self,
        prefix: &str,
        identity: Option<&str>,
        client: C,
    ) -> Result<Faked<RemoteOverlay<C>>>
    where
        C: RemoteClient,
    {
        let remote = self.config.remote_config().ok_or_else(|| {
            ImageryError::Config("remote.bucket is not set".to_string())
        })?;
        let overlay = RemoteOverlay::new(
            self.local_resource(prefix, identity)?,
            Gateway::new(client),
            remote,
        );
        Ok(Faked::new(overlay, self.gate.clone()))
    }
}
