//! # Storage Layer
//!
//! This module defines the storage contract for imagery. The [`Storage`] trait is
//! what callers hold; the implementations stack by wrapping one another:
//!
//! ```text
//! Faked<S>            short-circuits save/delete while a ModeGate says "fake"
//!   └─ RemoteOverlay  replicates every artifact to a remote bucket
//!        └─ Resource  local files: validate, reconcile, write, derive
//! ```
//!
//! Any layer can be used on its own: a plain [`Resource`](crate::resource::Resource)
//! is a complete local store.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! └── <prefix>/                 # e.g. avatar
//!     └── <identity>/           # e.g. 1001
//!         ├── original.jpg      # the upload, byte for byte
//!         ├── small.jpg         # one file per variant
//!         └── tiny.jpg
//! ```
//!
//! The directory *is* the identity namespace: deleting a resource is one recursive
//! remove of `<root>/<prefix>/<identity>`. Every artifact can be regenerated from
//! the original and the variant map, so there is no journal.
//!
//! ## Reconciliation
//!
//! `save(raw, Some(new))` on a resource currently at `old != new` removes `old`
//! before writing under `new`. Passing the current identity, or none at all,
//! overwrites in place. A resource without an identity never deletes anything.
//!
//! ## Implementations
//!
//! - [`fs::ArtifactStore`]: path construction and file I/O under a root.
//! - [`crate::resource::Resource`]: the local [`Storage`].
//! - [`crate::remote::RemoteOverlay`]: local plus remote replication.
//! - [`crate::mode::Faked`]: test-mode gate around any [`Storage`].

use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;

pub mod fs;

/// Reserved variant name for the raw upload.
pub const ORIGINAL: &str = "original";

/// Default artifact extension.
pub const DEFAULT_EXT: &str = "jpg";

/// A variant whose conversion the tool reported as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionFailure {
    pub variant: String,
    pub geometry: String,
}

/// What a `save` produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Identity the artifacts were written under. `None` for a faked save.
    pub identity: Option<String>,
    /// Path of the stored original.
    pub original: Option<PathBuf>,
    /// Variants that were derived successfully.
    pub variants: Vec<String>,
    /// Variants the tool failed to derive. Their files may be missing or stale.
    pub failures: Vec<ConversionFailure>,
    /// True when a mode gate skipped the save entirely.
    pub faked: bool,
}

impl SaveReport {
    pub fn faked() -> Self {
        Self {
            faked: true,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// `original` followed by every successfully derived variant.
    pub fn produced(&self) -> Vec<&str> {
        if self.faked {
            return Vec::new();
        }
        std::iter::once(ORIGINAL)
            .chain(self.variants.iter().map(String::as_str))
            .collect()
    }
}

/// Abstract interface for a stored image and its variants.
pub trait Storage {
    /// Validate `raw`, reconcile identity, write the original and derive every variant.
    ///
    /// Fails with `InvalidImage` before touching anything if `raw` is not an image.
    fn save(&mut self, raw: &[u8], new_identity: Option<&str>) -> Result<SaveReport>;

    /// Remove every artifact of the current identity. A no-op without an identity.
    fn delete(&mut self) -> Result<()>;

    /// Public URL for `variant` (use [`ORIGINAL`] for the upload itself).
    fn url(&self, variant: &str) -> String;

    /// Current identity, if any.
    fn identity(&self) -> Option<&str>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save(&mut self, raw: &[u8], new_identity: Option<&str>) -> Result<SaveReport> {
        (**self).save(raw, new_identity)
    }

    fn delete(&mut self) -> Result<()> {
        (**self).delete()
    }

    fn url(&self, variant: &str) -> String {
        (**self).url(variant)
    }

    fn identity(&self) -> Option<&str> {
        (**self).identity()
    }
}

/// Checks that `segment` can be used as one path component.
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}
