//! # Configuration
//!
//! Imagery configuration is declared with [`confique`] and loaded from TOML files
//! and environment variables.
//!
//! ## Priority
//!
//! 1. **Environment variables**: `IMAGERY_ROOT`, `IMAGERY_EXT`, `IMAGERY_S3_BUCKET`, ...
//! 2. **Explicit file**: the path passed as `--config`. Must exist.
//! 3. **Working directory**: `./imagery.toml`.
//! 4. **Global file**: `imagery.toml` in the OS config directory (via `directories`),
//!    or in `$IMAGERY_CONFIG_DIR` when set.
//! 5. **Compiled defaults**.
//!
//! ## Available Settings
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | `storage.root` | `IMAGERY_ROOT` | `<cwd>/public` |
//! | `storage.ext` | `IMAGERY_EXT` | `jpg` |
//! | `converter.program` | `IMAGERY_CONVERTER` | `gm` |
//! | `converter.quality` | `IMAGERY_QUALITY` | `80` |
//! | `remote.bucket` | `IMAGERY_S3_BUCKET` | unset (local only) |
//! | `remote.host` | `IMAGERY_S3_HOST` | `http://s3.amazonaws.com` |
//! | `remote.distribution_domain` | `IMAGERY_DISTRIBUTION_DOMAIN` | unset |
//!
//! ## Profiles
//!
//! Variant sets are declared per prefix. Each entry is `[resize]` or
//! `[resize, extent]`:
//!
//! ```toml
//! [profiles.avatar]
//! small = ["100x100^", "100x100"]
//! tiny = ["30x30"]
//! ```

use crate::converter::GmConverter;
use crate::error::{ImageryError, Result};
use crate::remote::RemoteConfig;
use crate::resource::Variants;
use crate::store::fs::ArtifactStore;
use confique::Config;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "imagery.toml";

/// Overrides the directory searched for the global config file.
pub const CONFIG_DIR_VAR: &str = "IMAGERY_CONFIG_DIR";

#[derive(Config, Debug, Clone)]
pub struct ImageryConfig {
    #[config(nested)]
    pub storage: StorageConfig,

    #[config(nested)]
    pub converter: ConverterConfig,

    #[config(nested)]
    pub remote: RemoteSection,

    /// Variant sets keyed by prefix.
    pub profiles: Option<BTreeMap<String, Variants>>,
}

#[derive(Config, Debug, Clone)]
pub struct StorageConfig {
    /// Artifact root. Relative paths resolve against the working directory.
    #[config(env = "IMAGERY_ROOT")]
    pub root: Option<PathBuf>,

    #[config(env = "IMAGERY_EXT", default = "jpg")]
    pub ext: String,
}

#[derive(Config, Debug, Clone)]
pub struct ConverterConfig {
    #[config(env = "IMAGERY_CONVERTER", default = "gm")]
    pub program: String,

    #[config(env = "IMAGERY_QUALITY", default = 80)]
    pub quality: u8,
}

#[derive(Config, Debug, Clone)]
pub struct RemoteSection {
    /// Replication is enabled when a bucket is set.
    #[config(env = "IMAGERY_S3_BUCKET")]
    pub bucket: Option<String>,

    #[config(env = "IMAGERY_S3_HOST", default = "http://s3.amazonaws.com")]
    pub host: String,

    #[config(env = "IMAGERY_DISTRIBUTION_DOMAIN")]
    pub distribution_domain: Option<String>,
}

/// The layers [`ImageryConfig::load_from`] reads, besides `./imagery.toml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// `--config`. Must exist when set.
    pub explicit: Option<PathBuf>,
    pub global: Option<PathBuf>,
    /// Read `IMAGERY_*` variables.
    pub env: bool,
}

impl ConfigSources {
    /// Every layer: environment, explicit file, working directory, global file.
    pub fn layered(explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            global: global_config_path(),
            env: true,
        }
    }

    /// Files under the caller's control only; the process environment and the
    /// global file are ignored.
    pub fn isolated(explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            global: None,
            env: false,
        }
    }

    pub fn with_global(mut self, path: PathBuf) -> Self {
        self.global = Some(path);
        self
    }
}

impl ImageryConfig {
    /// Loads the layered configuration. See the module docs for the order.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        Self::load_from(&ConfigSources::layered(explicit), cwd)
    }

    pub fn load_from(sources: &ConfigSources, cwd: &Path) -> Result<Self> {
        let mut builder = Self::builder();
        if sources.env {
            builder = builder.env();
        }

        if let Some(path) = &sources.explicit {
            if !path.is_file() {
                return Err(ImageryError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.file(path);
        }

        builder = builder.file(cwd.join(CONFIG_FILE));
        if let Some(global) = &sources.global {
            builder = builder.file(global);
        }

        builder
            .load()
            .map_err(|e| ImageryError::Config(e.to_string()))
    }

    /// Artifact root, resolved against `cwd`.
    pub fn root(&self, cwd: &Path) -> PathBuf {
        match &self.storage.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd.join("public"),
        }
    }

    pub fn artifact_store(&self, cwd: &Path) -> ArtifactStore {
        ArtifactStore::new(self.root(cwd)).with_ext(&self.storage.ext)
    }

    pub fn gm_converter(&self) -> GmConverter {
        GmConverter::new(&self.converter.program).with_quality(self.converter.quality)
    }

    /// Remote replication settings, when a bucket is configured.
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        let bucket = self.remote.bucket.as_deref().filter(|b| !b.is_empty())?;
        let mut config = RemoteConfig::new(bucket).with_host(&self.remote.host);
        if let Some(domain) = self.remote.distribution_domain.as_deref() {
            config = config.with_distribution_domain(domain);
        }
        Some(config)
    }

    /// Variants configured for `prefix`. Empty when the prefix has no profile.
    pub fn profile(&self, prefix: &str) -> Variants {
        self.profiles
            .as_ref()
            .and_then(|profiles| profiles.get(prefix))
            .cloned()
            .unwrap_or_default()
    }
}

/// `imagery.toml` in `$IMAGERY_CONFIG_DIR`, or in the OS config directory.
pub fn global_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_VAR) {
        return Some(PathBuf::from(dir).join(CONFIG_FILE));
    }
    ProjectDirs::from("com", "imagery", "imagery").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometrySpec;
    use std::fs;
    use tempfile::TempDir;

    fn load_toml(toml: &str) -> ImageryConfig {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, toml).unwrap();
        isolated(Some(&path), dir.path()).unwrap()
    }

    fn isolated(explicit: Option<&Path>, cwd: &Path) -> Result<ImageryConfig> {
        ImageryConfig::load_from(&ConfigSources::isolated(explicit), cwd)
    }

    #[test]
    fn defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config = isolated(None, dir.path()).unwrap();

        assert_eq!(config.converter.program, "gm");
        assert_eq!(config.converter.quality, 80);
        assert_eq!(config.remote.host, "http://s3.amazonaws.com");
        assert!(config.profile("avatar").is_empty());
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = isolated(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(matches!(err, ImageryError::Config(_)));
    }

    #[test]
    fn reads_sections_and_profiles() {
        let config = load_toml(
            r#"
            [storage]
            ext = "png"

            [converter]
            program = "/opt/gm/bin/gm"
            quality = 90

            [remote]
            bucket = "cdn.site.com"
            distribution_domain = "https://cdn.site.com"

            [profiles.avatar]
            small = ["100x100^", "100x100"]
            tiny = ["30x30"]
            "#,
        );

        assert_eq!(config.storage.ext, "png");
        assert_eq!(config.gm_converter().program(), "/opt/gm/bin/gm");
        assert_eq!(config.gm_converter().quality(), 90);

        let variants = config.profile("avatar");
        assert_eq!(variants.keys().collect::<Vec<_>>(), vec!["small", "tiny"]);
        assert_eq!(
            variants["small"],
            GeometrySpec::new("100x100^")
                .unwrap()
                .with_extent("100x100")
                .unwrap()
        );
        assert!(config.profile("photos").is_empty());

        let remote = config.remote_config().unwrap();
        assert_eq!(remote.bucket, "cdn.site.com");
        assert_eq!(
            remote.url_for("/avatar/1/original.png"),
            "https://cdn.site.com/avatar/1/original.png"
        );
    }

    #[test]
    fn invalid_geometry_in_profile_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[profiles.avatar]\nsmall = [\"big\"]\n").unwrap();

        let err = isolated(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, ImageryError::Config(_)));
    }

    #[test]
    fn cwd_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[storage]\nroot = \"assets\"\n").unwrap();

        let config = isolated(None, dir.path()).unwrap();
        assert_eq!(config.root(dir.path()), dir.path().join("assets"));
    }

    #[test]
    fn explicit_file_wins_over_cwd_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[converter]\nquality = 50\n").unwrap();
        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[converter]\nquality = 95\n").unwrap();

        let config = isolated(Some(&explicit), dir.path()).unwrap();
        assert_eq!(config.converter.quality, 95);
    }

    #[test]
    fn root_defaults_to_public_in_cwd() {
        let dir = TempDir::new().unwrap();
        let config = isolated(None, dir.path()).unwrap();
        let cwd = Path::new("/srv/app");
        assert_eq!(config.storage.root, None);
        assert_eq!(config.root(cwd), cwd.join("public"));
    }

    #[test]
    fn global_file_is_the_lowest_file_layer() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, r#"[storage]
ext = "png"

[converter]
quality = 60
"#).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[converter]
quality = 70
").unwrap();

        let sources = ConfigSources::isolated(None).with_global(global);
        let config = ImageryConfig::load_from(&sources, dir.path()).unwrap();

        assert_eq!(config.storage.ext, "png");
        assert_eq!(config.converter.quality, 70);
    }

    #[test]
    fn no_bucket_means_local_only() {
        let config = load_toml("[remote]\nbucket = \"\"\n");
        assert!(config.remote_config().is_none());
    }
}
