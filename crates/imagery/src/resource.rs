//! # Resource
//!
//! A [`Resource`] is one uploaded image under a prefix: the original plus a fixed
//! set of derived variants, all stored in one directory named after its identity.
//!
//! ## States
//!
//! - **Unidentified**: no identity. URLs point at `/missing/<prefix>/...` and
//!   `delete` does nothing. Saving a valid image requires a new identity.
//! - **Identified**: an identity is assigned; artifacts may or may not exist yet.
//!
//! An empty identity string counts as no identity.
//!
//! ## Save Pipeline
//!
//! 1. Identify the upload. Unrecognised bytes fail with `InvalidImage`; nothing
//!    has been written and the identity is unchanged. A recognised upload with
//!    neither a current nor a new identity fails with `InvalidIdentity`.
//! 2. Reconcile: a new identity that differs from the current one retires the
//!    current directory first.
//! 3. Adopt the new identity.
//! 4. Write the original.
//! 5. Derive every variant from that original, one tool call each.
//!
//! A variant the tool fails to derive is reported in [`SaveReport::failures`]; the
//! save itself still succeeds and nothing already written is rolled back.

use crate::converter::{read_source, Converter, GmConverter};
use crate::error::{ImageryError, Result};
use crate::geometry::GeometrySpec;
use crate::store::fs::ArtifactStore;
use crate::store::{is_valid_segment, ConversionFailure, SaveReport, Storage, ORIGINAL};
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// Variant name to geometry. Iteration order is by name.
pub type Variants = BTreeMap<String, GeometrySpec>;

/// Fresh random identity, for uploads that must never reuse a cached URL.
pub fn generate_identity() -> String {
    Uuid::new_v4().to_string()
}

pub struct Resource<C: Converter = GmConverter> {
    prefix: String,
    identity: Option<String>,
    variants: Variants,
    store: ArtifactStore,
    converter: C,
}

impl<C: Converter> Resource<C> {
    pub fn new(prefix: &str, store: ArtifactStore, converter: C) -> Result<Self> {
        if !is_valid_segment(prefix) {
            return Err(ImageryError::InvalidIdentity(format!(
                "prefix '{}' is not a single path segment",
                prefix
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            identity: None,
            variants: Variants::new(),
            store,
            converter,
        })
    }

    pub fn with_identity(mut self, identity: Option<&str>) -> Result<Self> {
        self.identity = normalize_identity(identity)?;
        Ok(self)
    }

    pub fn with_variant(mut self, name: &str, spec: GeometrySpec) -> Result<Self> {
        validate_variant_name(name)?;
        self.variants.insert(name.to_string(), spec);
        Ok(self)
    }

    pub fn with_variants(mut self, variants: Variants) -> Result<Self> {
        for name in variants.keys() {
            validate_variant_name(name)?;
        }
        self.variants = variants;
        Ok(self)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn variants(&self) -> &Variants {
        &self.variants
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// `original` followed by every variant name: the full artifact set.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(ORIGINAL)
            .chain(self.variants.keys().map(String::as_str))
            .collect()
    }

    /// Local path of an artifact, or `None` while unidentified.
    pub fn path_for(&self, variant: &str) -> Option<PathBuf> {
        self.identity
            .as_deref()
            .map(|id| self.store.path_for(&self.prefix, id, variant))
    }

    /// The `/<prefix>/<identity>/<variant>.<ext>` form, or its `/missing/` fallback.
    pub fn url_path(&self, variant: &str) -> String {
        let file = self.store.file_name(variant);
        match &self.identity {
            Some(id) => format!("/{}/{}/{}", self.prefix, id, file),
            None => format!("/missing/{}/{}", self.prefix, file),
        }
    }

    /// Saves from a reader, leaving its position where it was.
    pub fn save_from<R: Read + Seek>(
        &mut self,
        source: &mut R,
        new_identity: Option<&str>,
    ) -> Result<SaveReport> {
        let raw = read_source(source)?;
        self.save(&raw, new_identity)
    }

    /// Runs the save pipeline. `on_retire` is called right after the previous
    /// identity's local artifacts are removed, while `self` still carries that identity.
    pub(crate) fn save_with<F>(
        &mut self,
        raw: &[u8],
        new_identity: Option<&str>,
        mut on_retire: F,
    ) -> Result<SaveReport>
    where
        F: FnMut(&Self) -> Result<()>,
    {
        let new_identity = normalize_identity(new_identity)?;

        if !self.converter.identify(raw)? {
            return Err(ImageryError::InvalidImage);
        }

        let identity = match (&new_identity, &self.identity) {
            (Some(new), _) => new.clone(),
            (None, Some(current)) => current.clone(),
            (None, None) => {
                return Err(ImageryError::InvalidIdentity(format!(
                    "resource under '{}' has no identity; pass one to save",
                    self.prefix
                )))
            }
        };

        if let Some(current) = &self.identity {
            if *current != identity {
                info!(prefix = %self.prefix, from = %current, to = %identity, "replacing identity");
                self.remove_local()?;
                on_retire(&*self)?;
            }
        }
        self.identity = Some(identity.clone());

        let original = self.store.write_original(&self.prefix, &identity, raw)?;

        let mut report = SaveReport {
            identity: Some(identity.clone()),
            original: Some(original.clone()),
            ..Default::default()
        };

        for (name, spec) in &self.variants {
            let dst = self.store.path_for(&self.prefix, &identity, name);
            if self.converter.convert(&original, &dst, spec)? {
                report.variants.push(name.clone());
            } else {
                warn!(prefix = %self.prefix, identity = %identity, variant = %name, geometry = %spec, "conversion failed");
                report.failures.push(ConversionFailure {
                    variant: name.clone(),
                    geometry: spec.to_string(),
                });
            }
        }

        info!(
            prefix = %self.prefix,
            identity = %identity,
            variants = report.variants.len(),
            failures = report.failures.len(),
            "saved resource"
        );
        Ok(report)
    }

    fn remove_local(&self) -> Result<()> {
        match &self.identity {
            Some(id) => self.store.remove_all(&self.prefix, id),
            None => Ok(()),
        }
    }
}

impl<C: Converter> Storage for Resource<C> {
    fn save(&mut self, raw: &[u8], new_identity: Option<&str>) -> Result<SaveReport> {
        self.save_with(raw, new_identity, |_| Ok(()))
    }

    fn delete(&mut self) -> Result<()> {
        if let Some(id) = &self.identity {
            self.store.remove_all(&self.prefix, id)?;
            info!(prefix = %self.prefix, identity = %id, "deleted resource");
        }
        Ok(())
    }

    fn url(&self, variant: &str) -> String {
        self.url_path(variant)
    }

    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

fn normalize_identity(identity: Option<&str>) -> Result<Option<String>> {
    match identity {
        None | Some("") => Ok(None),
        Some(id) if is_valid_segment(id) => Ok(Some(id.to_string())),
        Some(id) => Err(ImageryError::InvalidIdentity(format!(
            "'{}' is not a single path segment",
            id
        ))),
    }
}

fn validate_variant_name(name: &str) -> Result<()> {
    if name == ORIGINAL {
        return Err(ImageryError::InvalidVariant(format!(
            "'{}' is reserved for the upload itself",
            ORIGINAL
        )));
    }
    if !is_valid_segment(name) {
        return Err(ImageryError::InvalidVariant(format!("'{}'", name)));
    }
    Ok(())
}
