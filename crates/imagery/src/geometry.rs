//! # Geometry
//!
//! A [`GeometrySpec`] describes one derived variant: the resize geometry handed to
//! `gm convert -resize` and an optional extent that pads/crops the result to an
//! exact canvas.
//!
//! ## Grammar
//!
//! ```text
//! geometry := width? ("x" height?)? modifier*
//! modifier := "^" | ">" | "<" | "!" | "%" | "@"
//! extent   := width? ("x" height?)?
//! ```
//!
//! At least one of width/height must be present. Examples: `100x100`, `100x100^`,
//! `640x>`, `x90`, `50%`.
//!
//! The modifiers only mean something to `-resize`. The `-size` read hint must be a
//! plain dimension, so [`GeometrySpec::size_hint`] strips them.

use crate::error::{ImageryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Modifier characters stripped from the `-size` hint.
const SIZE_MODIFIERS: [char; 4] = ['^', '>', '<', '!'];

/// All modifier characters accepted after a resize dimension.
const RESIZE_MODIFIERS: [char; 6] = ['^', '>', '<', '!', '%', '@'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct GeometrySpec {
    resize: String,
    extent: Option<String>,
}

impl GeometrySpec {
    /// A resize-only variant: the result fits within the geometry, keeping its aspect ratio.
    pub fn new(resize: &str) -> Result<Self> {
        let resize = resize.trim();
        validate(resize, &RESIZE_MODIFIERS)?;
        Ok(Self {
            resize: resize.to_string(),
            extent: None,
        })
    }

    /// Pads or crops the resized image around its center to exactly `extent`.
    pub fn with_extent(mut self, extent: &str) -> Result<Self> {
        let extent = extent.trim();
        validate(extent, &[])?;
        self.extent = Some(extent.to_string());
        Ok(self)
    }

    pub fn resize(&self) -> &str {
        &self.resize
    }

    pub fn extent(&self) -> Option<&str> {
        self.extent.as_deref()
    }

    /// The resize geometry minus `^ > < !`, used as the `-size` read hint.
    pub fn size_hint(&self) -> String {
        self.resize
            .chars()
            .filter(|c| !SIZE_MODIFIERS.contains(c))
            .collect()
    }
}

impl fmt::Display for GeometrySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extent {
            Some(extent) => write!(f, "{} (extent {})", self.resize, extent),
            None => write!(f, "{}", self.resize),
        }
    }
}

impl TryFrom<Vec<String>> for GeometrySpec {
    type Error = ImageryError;

    fn try_from(parts: Vec<String>) -> Result<Self> {
        match parts.as_slice() {
            [resize] => GeometrySpec::new(resize),
            [resize, extent] => GeometrySpec::new(resize)?.with_extent(extent),
            _ => Err(ImageryError::InvalidGeometry(format!(
                "expected [resize] or [resize, extent], got {} elements",
                parts.len()
            ))),
        }
    }
}

impl From<GeometrySpec> for Vec<String> {
    fn from(spec: GeometrySpec) -> Self {
        let mut parts = vec![spec.resize];
        parts.extend(spec.extent);
        parts
    }
}

fn validate(token: &str, modifiers: &[char]) -> Result<()> {
    let invalid = || ImageryError::InvalidGeometry(format!("'{}'", token));

    let dims = token.trim_end_matches(|c| modifiers.contains(&c));
    if dims.is_empty() {
        return Err(invalid());
    }

    let (width, height) = match dims.split_once('x') {
        Some((w, h)) => (w, h),
        None => (dims, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(width) || !all_digits(height) {
        return Err(invalid());
    }
    if width.is_empty() && height.is_empty() {
        return Err(invalid());
    }

    Ok(())
}
