//! Text and JSON rendering of command results.
//!
//! Every renderer returns a `String`; `commands.rs` decides where it goes.

use console::Style;
use imagery::store::ConversionFailure;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Artifact {
    pub variant: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveOutput {
    pub prefix: String,
    pub identity: Option<String>,
    pub faked: bool,
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<ConversionFailure>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutput {
    pub prefix: String,
    pub identity: String,
    pub faked: bool,
}

#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub prefix: String,
    pub identity: String,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
pub struct IdentifyOutput {
    pub file: String,
    pub valid: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

struct Styles {
    name: Style,
    dim: Style,
    warn: Style,
}

fn styles() -> Styles {
    Styles {
        name: Style::new().bold(),
        dim: Style::new().dim(),
        warn: Style::new().yellow(),
    }
}

pub fn json<T: Serialize>(value: &T) -> String {
    // Output structs hold only strings, bools and integers.
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub fn save(out: &SaveOutput) -> String {
    let s = styles();
    if out.faked {
        return format!("{}\n", s.dim.apply_to("fake mode: nothing saved"));
    }

    let mut text = String::new();
    if let Some(identity) = &out.identity {
        text.push_str(&format!(
            "Saved {}/{}\n",
            out.prefix,
            s.name.apply_to(identity)
        ));
    }
    text.push_str(&artifact_lines(&out.artifacts));
    for failure in &out.failures {
        text.push_str(&format!(
            "{}\n",
            s.warn.apply_to(format!(
                "  {} failed ({})",
                failure.variant, failure.geometry
            ))
        ));
    }
    text
}

pub fn delete(out: &DeleteOutput) -> String {
    if out.faked {
        return format!("{}\n", styles().dim.apply_to("fake mode: nothing deleted"));
    }
    format!("Deleted {}/{}\n", out.prefix, out.identity)
}

pub fn list(out: &ListOutput) -> String {
    if out.artifacts.is_empty() {
        return format!(
            "{}\n",
            styles()
                .dim
                .apply_to(format!("No artifacts for {}/{}", out.prefix, out.identity))
        );
    }
    artifact_lines(&out.artifacts)
}

pub fn identify(out: &IdentifyOutput) -> String {
    match (out.valid, out.width, out.height) {
        (true, Some(w), Some(h)) => format!("{}: image {}x{}\n", out.file, w, h),
        (true, _, _) => format!("{}: image\n", out.file),
        (false, _, _) => format!("{}: not an image\n", out.file),
    }
}

fn artifact_lines(artifacts: &[Artifact]) -> String {
    let s = styles();
    let width = artifacts.iter().map(|a| a.variant.len()).max().unwrap_or(0);
    artifacts
        .iter()
        .map(|a| {
            format!(
                "  {}  {}\n",
                s.name.apply_to(format!("{:width$}", a.variant, width = width)),
                s.dim.apply_to(&a.url)
            )
        })
        .collect()
}
