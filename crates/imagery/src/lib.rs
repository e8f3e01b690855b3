//! # Imagery Architecture
//!
//! Imagery stores uploaded images together with a fixed set of derived variants
//! (thumbnails, crops) and hands back stable URLs for them. Uploads are validated
//! and resized by an external GraphicsMagick process; artifacts live on the local
//! filesystem and may be mirrored into an S3-style bucket.
//!
//! It is a library first. The `imagery` binary in `crates/imagery-cli` is a thin
//! client over it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Context (init.rs, config.rs)                               │
//! │  - Loads configuration, builds the storage stack per prefix │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage stack (mode.rs, remote/, resource.rs)              │
//! │  - Faked<S>: skips save/delete in fake mode                 │
//! │  - RemoteOverlay: mirrors artifacts to a bucket             │
//! │  - Resource: identity reconciliation and the save pipeline  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Primitives (converter.rs, store/fs.rs, geometry.rs)        │
//! │  - GmConverter: identify + convert via `gm`                 │
//! │  - ArtifactStore: path construction and file I/O            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every layer implements [`store::Storage`], so callers hold a
//! `Box<dyn Storage>` and never care which layers are stacked.
//!
//! ## No I/O Assumptions
//!
//! Nothing in this crate writes to stdout/stderr or exits the process. Diagnostics
//! go through `tracing`; the binary decides whether and where to show them.
//!
//! ## Module Overview
//!
//! - [`geometry`]: Variant geometry (resize plus optional extent)
//! - [`converter`]: The external image tool boundary
//! - [`store`]: The `Storage` contract and the on-disk layout
//! - [`resource`]: The local storage and its state machine
//! - [`remote`]: Bucket replication
//! - [`mode`]: Fake/real test-mode gating
//! - [`config`]: Layered configuration
//! - [`init`]: Context wiring
//! - [`error`]: Error types

pub mod config;
pub mod converter;
pub mod error;
pub mod geometry;
pub mod init;
pub mod mode;
pub mod remote;
pub mod resource;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use converter::{Converter, GmConverter};
pub use error::{ImageryError, Result};
pub use geometry::GeometrySpec;
pub use mode::{Faked, Mode, ModeGate};
pub use resource::{generate_identity, Resource, Variants};
pub use store::{SaveReport, Storage, ORIGINAL};
