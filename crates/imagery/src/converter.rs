//! # Converter
//!
//! The boundary to the external image tool. Everything here shells out; nothing
//! decodes pixels in-process.
//!
//! | Operation | Invocation |
//! |---|---|
//! | identify | `gm identify <scratch>` |
//! | convert | `gm convert -size <hint> <src> -resize <geometry> [extent] -quality 80 <dst>` |
//! | resolution | `gm identify -format %wx%h <path>` |
//!
//! The extent clause, when a variant has one, is
//! `-background black -compose Copy -gravity center -extent <extent>`.
//!
//! Both `identify` and `convert` report the tool's verdict as `Ok(bool)`. `Err` is
//! reserved for the tool not running at all (missing binary, unwritable scratch file).

use crate::error::{ImageryError, Result};
use crate::geometry::GeometrySpec;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "gm";

pub const DEFAULT_QUALITY: u8 = 80;

/// Validates uploads and derives resized variants.
pub trait Converter {
    /// Returns true iff the tool recognises `raw` as an image.
    fn identify(&self, raw: &[u8]) -> Result<bool>;

    /// Derives `dst` from `src`. Returns true iff the tool reported success.
    fn convert(&self, src: &Path, dst: &Path, spec: &GeometrySpec) -> Result<bool>;
}

impl<C: Converter + ?Sized> Converter for &C {
    fn identify(&self, raw: &[u8]) -> Result<bool> {
        (**self).identify(raw)
    }

    fn convert(&self, src: &Path, dst: &Path, spec: &GeometrySpec) -> Result<bool> {
        (**self).convert(src, dst, spec)
    }
}

/// GraphicsMagick-backed converter.
#[derive(Debug, Clone)]
pub struct GmConverter {
    program: String,
    quality: u8,
}

impl Default for GmConverter {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl GmConverter {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Builds the argv for `convert`, without the program name.
    pub fn convert_args(&self, src: &Path, dst: &Path, spec: &GeometrySpec) -> Vec<String> {
        let mut args = vec![
            "convert".to_string(),
            "-size".to_string(),
            spec.size_hint(),
            src.display().to_string(),
            "-resize".to_string(),
            spec.resize().to_string(),
        ];
        if let Some(extent) = spec.extent() {
            args.extend(
                [
                    "-background",
                    "black",
                    "-compose",
                    "Copy",
                    "-gravity",
                    "center",
                    "-extent",
                    extent,
                ]
                .iter()
                .map(|s| s.to_string()),
            );
        }
        args.push("-quality".to_string());
        args.push(self.quality.to_string());
        args.push(dst.display().to_string());
        args
    }

    /// Reads the pixel dimensions of an image file, or `None` if the tool rejects it.
    pub fn resolution(&self, path: &Path) -> Result<Option<(u32, u32)>> {
        let output = self.output(&[
            "identify".to_string(),
            "-format".to_string(),
            "%wx%h".to_string(),
            path.display().to_string(),
        ])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_resolution(&String::from_utf8_lossy(&output.stdout)))
    }

    fn status(&self, args: &[String]) -> Result<bool> {
        debug!(program = %self.program, ?args, "invoking image tool");
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ImageryError::Converter(format!("Failed to run {}: {}", self.program, e)))?;
        debug!(program = %self.program, success = status.success(), "image tool finished");
        Ok(status.success())
    }

    fn output(&self, args: &[String]) -> Result<Output> {
        debug!(program = %self.program, ?args, "invoking image tool");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ImageryError::Converter(format!("Failed to run {}: {}", self.program, e)))
    }
}

impl Converter for GmConverter {
    fn identify(&self, raw: &[u8]) -> Result<bool> {
        // Dropping the handle removes the scratch file on every path out of here.
        let mut scratch = tempfile::Builder::new()
            .prefix("imagery-")
            .tempfile()?;
        scratch.write_all(raw)?;
        scratch.flush()?;

        self.status(&[
            "identify".to_string(),
            scratch.path().display().to_string(),
        ])
    }

    fn convert(&self, src: &Path, dst: &Path, spec: &GeometrySpec) -> Result<bool> {
        self.status(&self.convert_args(src, dst, spec))
    }
}

/// Reads `source` to the end and puts its cursor back where it was.
pub fn read_source<R: Read + Seek>(source: &mut R) -> Result<Vec<u8>> {
    let start = source.stream_position()?;
    let mut raw = Vec::new();
    let read = source.read_to_end(&mut raw);
    source.seek(SeekFrom::Start(start))?;
    read?;
    Ok(raw)
}

fn parse_resolution(text: &str) -> Option<(u32, u32)> {
    // Multi-frame images print one geometry per frame; the first one is enough.
    let first = text.split_whitespace().next()?;
    let (w, h) = first.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}
