//! End-to-end runs against a real GraphicsMagick install.
//!
//! Ignored by default: `cargo test -- --ignored` with `gm` on the PATH.

use imagery::converter::{Converter, GmConverter};
use imagery::geometry::GeometrySpec;
use imagery::resource::Resource;
use imagery::store::fs::ArtifactStore;
use imagery::store::{Storage, ORIGINAL};
use imagery::ImageryError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Renders a flat gray 1024x768 JPEG with `gm convert -size 1024x768 xc:gray`.
fn fixture(dir: &Path) -> Vec<u8> {
    let path = dir.join("fixture.jpg");
    let status = Command::new("gm")
        .args(["convert", "-size", "1024x768", "xc:gray"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success(), "gm could not render the fixture");
    fs::read(path).unwrap()
}

fn setup() -> (TempDir, PathBuf, Vec<u8>) {
    let dir = TempDir::new().unwrap();
    let raw = fixture(dir.path());
    let root = dir.path().join("public");
    (dir, root, raw)
}

fn avatar(root: &Path, identity: &str, variants: &[(&str, GeometrySpec)]) -> Resource {
    let mut res = Resource::new("avatar", ArtifactStore::new(root.to_path_buf()), GmConverter::default())
        .unwrap()
        .with_identity(Some(identity))
        .unwrap();
    for (name, spec) in variants {
        res = res.with_variant(name, spec.clone()).unwrap();
    }
    res
}

fn resolution(path: &Path) -> (u32, u32) {
    GmConverter::default().resolution(path).unwrap().unwrap()
}

#[test]
#[ignore]
fn resize_keeps_aspect_ratio() {
    let (_dir, root, raw) = setup();
    let mut res = avatar(
        &root,
        "1001",
        &[
            ("small", GeometrySpec::new("100x100").unwrap()),
            ("tiny", GeometrySpec::new("30x30").unwrap()),
        ],
    );

    let report = res.save(&raw, None).unwrap();

    assert!(report.is_complete());
    assert_eq!(resolution(&res.path_for(ORIGINAL).unwrap()), (1024, 768));
    assert_eq!(resolution(&res.path_for("small").unwrap()), (100, 75));
    assert_eq!(resolution(&res.path_for("tiny").unwrap()), (30, 23));
}

#[test]
#[ignore]
fn extent_produces_exact_canvas() {
    let (_dir, root, raw) = setup();
    let spec = GeometrySpec::new("100x100^")
        .unwrap()
        .with_extent("100x100")
        .unwrap();
    let mut res = avatar(&root, "1001", &[("small", spec)]);

    res.save(&raw, None).unwrap();

    assert_eq!(resolution(&res.path_for("small").unwrap()), (100, 100));
}

#[test]
#[ignore]
fn new_identity_moves_every_artifact() {
    let (_dir, root, raw) = setup();
    let mut res = avatar(&root, "1001", &[("small", GeometrySpec::new("100x100").unwrap())]);
    res.save(&raw, None).unwrap();

    res.save(&raw, Some("GUID")).unwrap();

    assert!(!root.join("avatar/1001").exists());
    assert_eq!(resolution(&root.join("avatar/GUID/original.jpg")), (1024, 768));
    assert_eq!(resolution(&root.join("avatar/GUID/small.jpg")), (100, 75));
}

#[test]
#[ignore]
fn garbage_is_rejected() {
    let (_dir, root, raw) = setup();
    let mut res = avatar(&root, "1001", &[]);
    res.save(&raw, None).unwrap();

    let err = res.save(b"definitely not an image", Some("1002")).unwrap_err();

    assert!(matches!(err, ImageryError::InvalidImage));
    assert_eq!(res.identity(), Some("1001"));
    assert_eq!(fs::read(root.join("avatar/1001/original.jpg")).unwrap(), raw);
}

#[test]
#[ignore]
fn identify_accepts_fixture() {
    let dir = TempDir::new().unwrap();
    let raw = fixture(dir.path());
    let gm = GmConverter::default();

    assert!(gm.identify(&raw).unwrap());
    assert!(!gm.identify(b"GIF? no").unwrap());
}

#[test]
fn missing_program_is_a_converter_error() {
    let gm = GmConverter::new("imagery-no-such-program");
    let err = gm.identify(b"\xFF\xD8\xFF").unwrap_err();
    assert!(matches!(err, ImageryError::Converter(_)));
}
