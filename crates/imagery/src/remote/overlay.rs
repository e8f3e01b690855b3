use super::{Gateway, RemoteClient, RemoteConfig, RemoteError, StoreOptions};
use crate::converter::{Converter, GmConverter};
use crate::error::{ImageryError, Result};
use crate::resource::Resource;
use crate::store::{SaveReport, Storage};
use tracing::info;

/// Remote key of one artifact: `<prefix>/<identity>/<variant>.<ext>`.
pub fn remote_key<V: Converter>(resource: &Resource<V>, variant: &str) -> Option<String> {
    resource.identity().map(|id| {
        format!(
            "{}/{}/{}",
            resource.prefix(),
            id,
            resource.store().file_name(variant)
        )
    })
}

/// A local [`Resource`] whose artifacts are mirrored to a remote bucket.
pub struct RemoteOverlay<C: RemoteClient, V: Converter = GmConverter> {
    inner: Resource<V>,
    gateway: Gateway<C>,
    config: RemoteConfig,
    options: StoreOptions,
}

impl<C: RemoteClient, V: Converter> RemoteOverlay<C, V> {
    pub fn new(inner: Resource<V>, gateway: Gateway<C>, config: RemoteConfig) -> Self {
        Self {
            inner,
            gateway,
            config,
            options: StoreOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn inner(&self) -> &Resource<V> {
        &self.inner
    }

    pub fn gateway(&self) -> &Gateway<C> {
        &self.gateway
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }
}

/// Deletes every key the resource would own under its current identity.
fn delete_remote<C: RemoteClient, V: Converter>(
    gateway: &Gateway<C>,
    bucket: &str,
    resource: &Resource<V>,
) -> std::result::Result<(), RemoteError> {
    for name in resource.names() {
        if let Some(key) = remote_key(resource, name) {
            gateway.delete(&key, bucket)?;
        }
    }
    Ok(())
}

impl<C: RemoteClient, V: Converter> Storage for RemoteOverlay<C, V> {
    fn save(&mut self, raw: &[u8], new_identity: Option<&str>) -> Result<SaveReport> {
        let gateway = &self.gateway;
        let bucket = self.config.bucket.as_str();

        let report = self.inner.save_with(raw, new_identity, |old| {
            delete_remote(gateway, bucket, old).map_err(ImageryError::Remote)
        })?;

        for name in report.produced() {
            let (Some(key), Some(path)) = (
                remote_key(&self.inner, name),
                self.inner.path_for(name),
            ) else {
                continue;
            };
            gateway.store(&key, &path, bucket, &self.options)?;
        }

        info!(
            bucket = %bucket,
            uploaded = report.produced().len(),
            "replicated resource"
        );
        Ok(report)
    }

    fn delete(&mut self) -> Result<()> {
        if self.inner.identity().is_none() {
            return Ok(());
        }
        self.inner.delete()?;
        delete_remote(&self.gateway, &self.config.bucket, &self.inner)?;
        Ok(())
    }

    fn url(&self, variant: &str) -> String {
        self.config.url_for(&self.inner.url_path(variant))
    }

    fn identity(&self) -> Option<&str> {
        self.inner.identity()
    }
}
