use crate::converter::Converter;
use crate::error::Result;
use crate::geometry::GeometrySpec;
use crate::resource::Resource;
use crate::store::fs::ArtifactStore;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A few bytes that pass [`RecordingConverter::identify`]: SOI, APP0 marker, EOI.
pub fn jpeg_bytes() -> Vec<u8> {
    vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterCall {
    Identify,
    Convert {
        src: PathBuf,
        dst: PathBuf,
        resize: String,
        extent: Option<String>,
    },
}

/// Converter double: accepts anything starting with the JPEG SOI marker and
/// "converts" by copying the source file. Records every call.
#[derive(Debug, Default)]
pub struct RecordingConverter {
    calls: RefCell<Vec<ConverterCall>>,
    failing: HashSet<String>,
}

impl RecordingConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `convert` report failure for the variant whose file stem is `variant`.
    pub fn failing_for(mut self, variant: &str) -> Self {
        self.failing.insert(variant.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ConverterCall> {
        self.calls.borrow().clone()
    }
}

impl Converter for RecordingConverter {
    fn identify(&self, raw: &[u8]) -> Result<bool> {
        self.calls.borrow_mut().push(ConverterCall::Identify);
        Ok(raw.starts_with(&[0xFF, 0xD8, 0xFF]))
    }

    fn convert(&self, src: &Path, dst: &Path, spec: &GeometrySpec) -> Result<bool> {
        self.calls.borrow_mut().push(ConverterCall::Convert {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            resize: spec.resize().to_string(),
            extent: spec.extent().map(str::to_string),
        });

        let stem = dst.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if self.failing.contains(stem) {
            return Ok(false);
        }
        fs::copy(src, dst)?;
        Ok(true)
    }
}

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().join("public");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.root.clone())
    }

    /// A resource with no variants, backed by a fresh [`RecordingConverter`].
    pub fn resource(&self, prefix: &str, identity: Option<&str>) -> Resource<RecordingConverter> {
        Resource::new(prefix, self.store(), RecordingConverter::new())
            .and_then(|r| r.with_identity(identity))
            .expect("valid test resource")
    }
}
