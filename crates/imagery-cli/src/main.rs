//! # Imagery CLI
//!
//! The `imagery` binary is a thin client over the `imagery` library. This file only
//! invokes `cli::run()` and turns an error into exit code 1; everything else lives
//! in `src/cli/`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (src/cli/)                                       │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + dispatch (commands.rs)                  │
//! │  - Human and JSON output (render.rs)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  imagery::init::ImageryContext                              │
//! │  - Config, artifact store, converter, mode gate             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logging goes to stderr through `tracing-subscriber`; stdout carries only command
//! output, so `--json` output can be piped.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
