//! # CLI Behavior
//!
//! One possible client for imagery. The CLI is the only place that knows about
//! terminal I/O, exit codes and output formatting.
//!
//! ## Commands
//!
//! - `imagery save <prefix> <file>`: validate and store an upload, derive the
//!   prefix's configured variants, print each artifact's URL.
//!   - `--current ID` names the identity the resource has now.
//!   - `--id ID` saves under a new identity, retiring `--current` if it differs.
//!   - `--fresh` saves under a newly generated identity.
//! - `imagery delete <prefix> <id>`: remove every artifact of one resource.
//! - `imagery url <prefix> [id] [--variant NAME]`: print where an artifact is served.
//! - `imagery ls <prefix> <id>`: list the artifacts on disk.
//! - `imagery identify <file>`: check an image and report its resolution.
//!
//! `--fake` turns `save` and `delete` into no-ops that still report success.
//! `--json` prints machine-readable output instead of styled text.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Context setup and per-command handlers
//! - `render`: Human and JSON output

mod commands;
mod render;
pub mod setup;

pub use commands::run;
