use super::{DEFAULT_EXT, ORIGINAL};
use crate::error::{ImageryError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Filesystem persistence for resource artifacts under a single root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    ext: String,
}

impl ArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ext: DEFAULT_EXT.to_string(),
        }
    }

    pub fn with_ext(mut self, ext: &str) -> Self {
        self.ext = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// `<variant>.<ext>`
    pub fn file_name(&self, variant: &str) -> String {
        format!("{}.{}", variant, self.ext)
    }

    /// Directory holding every artifact of one resource.
    pub fn resource_dir(&self, prefix: &str, identity: &str) -> PathBuf {
        self.root.join(prefix).join(identity)
    }

    pub fn path_for(&self, prefix: &str, identity: &str, variant: &str) -> PathBuf {
        self.resource_dir(prefix, identity)
            .join(self.file_name(variant))
    }

    pub fn original_path(&self, prefix: &str, identity: &str) -> PathBuf {
        self.path_for(prefix, identity, ORIGINAL)
    }

    pub fn ensure_root(&self, prefix: &str, identity: &str) -> Result<PathBuf> {
        let dir = self.resource_dir(prefix, identity);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(ImageryError::Io)?;
        }
        Ok(dir)
    }

    /// Writes the raw upload as the `original` artifact, replacing any previous one.
    pub fn write_original(&self, prefix: &str, identity: &str, raw: &[u8]) -> Result<PathBuf> {
        let dir = self.ensure_root(prefix, identity)?;
        let target = dir.join(self.file_name(ORIGINAL));

        // Atomic Write
        let tmp = dir.join(format!(".original-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, raw).map_err(ImageryError::Io)?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(ImageryError::Io(e));
        }

        debug!(path = %target.display(), bytes = raw.len(), "wrote original");
        Ok(target)
    }

    pub fn exists(&self, prefix: &str, identity: &str, variant: &str) -> bool {
        self.path_for(prefix, identity, variant).is_file()
    }

    /// Variant names currently on disk for a resource, sorted.
    pub fn artifact_names(&self, prefix: &str, identity: &str) -> Result<Vec<String>> {
        let dir = self.resource_dir(prefix, identity);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let suffix = format!(".{}", self.ext);
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(ImageryError::Io)? {
            let entry = entry.map_err(ImageryError::Io)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                if let Some(variant) = name.strip_suffix(&suffix) {
                    if !variant.starts_with('.') {
                        names.push(variant.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Recursively removes the resource directory. Missing directories are fine.
    pub fn remove_all(&self, prefix: &str, identity: &str) -> Result<()> {
        let dir = self.resource_dir(prefix, identity);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(path = %dir.display(), "removed resource directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ImageryError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn path_construction() {
        let store = ArtifactStore::new(PathBuf::from("/srv/public"));
        assert_eq!(
            store.path_for("avatar", "1001", "small"),
            PathBuf::from("/srv/public/avatar/1001/small.jpg")
        );
        assert_eq!(
            store.original_path("avatar", "1001"),
            PathBuf::from("/srv/public/avatar/1001/original.jpg")
        );
    }

    #[test]
    fn custom_extension_is_normalized() {
        let store = ArtifactStore::new(PathBuf::from("/r")).with_ext(".png");
        assert_eq!(store.ext(), "png");
        assert_eq!(store.file_name("tiny"), "tiny.png");
    }

    #[test]
    fn ensure_root_is_idempotent() {
        let (_dir, store) = setup();
        let first = store.ensure_root("avatar", "1001").unwrap();
        let second = store.ensure_root("avatar", "1001").unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn write_original_overwrites() {
        let (_dir, store) = setup();
        store.write_original("avatar", "1001", b"first").unwrap();
        let path = store.write_original("avatar", "1001", b"second").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn write_original_leaves_no_tmp_files() {
        let (_dir, store) = setup();
        store.write_original("avatar", "1001", b"bytes").unwrap();

        let names = store.artifact_names("avatar", "1001").unwrap();
        assert_eq!(names, vec!["original"]);

        for entry in fs::read_dir(store.resource_dir("avatar", "1001")).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
    }

    #[test]
    fn artifact_names_ignores_other_extensions() {
        let (_dir, store) = setup();
        let dir = store.ensure_root("avatar", "1001").unwrap();
        fs::write(dir.join("small.jpg"), b"x").unwrap();
        fs::write(dir.join("original.jpg"), b"x").unwrap();
        fs::write(dir.join("notes.txt"), b"x").unwrap();

        assert_eq!(
            store.artifact_names("avatar", "1001").unwrap(),
            vec!["original", "small"]
        );
        assert!(store.artifact_names("avatar", "missing").unwrap().is_empty());
    }

    #[test]
    fn remove_all_is_recursive_and_idempotent() {
        let (_dir, store) = setup();
        store.write_original("avatar", "1001", b"x").unwrap();
        fs::create_dir_all(store.resource_dir("avatar", "1001").join("nested")).unwrap();

        store.remove_all("avatar", "1001").unwrap();
        assert!(!store.resource_dir("avatar", "1001").exists());

        store.remove_all("avatar", "1001").unwrap();
    }

    #[test]
    fn remove_all_keeps_siblings() {
        let (_dir, store) = setup();
        store.write_original("avatar", "1001", b"x").unwrap();
        store.write_original("avatar", "1002", b"y").unwrap();

        store.remove_all("avatar", "1001").unwrap();
        assert!(store.exists("avatar", "1002", ORIGINAL));
    }
}
