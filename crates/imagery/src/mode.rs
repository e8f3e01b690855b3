//! # Mode Gate
//!
//! Test suites rarely want real conversions or remote uploads. A [`ModeGate`] is a
//! shared switch that a [`Faked`] storage consults on every `save` and `delete`:
//!
//! - [`Mode::Normal`] and [`Mode::Real`]: calls go through to the wrapped storage.
//! - [`Mode::Fake`]: calls return success immediately. Nothing is identified,
//!   written, converted or uploaded.
//!
//! The gate is a value, not a process global. Clones share the same switch, so a
//! harness can hold one handle while every storage it builds holds another.
//!
//! ```ignore
//! let gate = ModeGate::new();
//! let mut avatar = Faked::new(resource, gate.clone());
//! gate.faked(|| avatar.save(&bytes, Some("1")))?;   // touches nothing
//! ```
//!
//! [`ModeGate::faked`] and [`ModeGate::real`] restore the previous mode when the
//! closure returns or unwinds.

use crate::error::Result;
use crate::store::{SaveReport, Storage};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Environment variable that opts a test run into real processing.
pub const REAL_MODE_VAR: &str = "REAL_IMAGERY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Fake,
    Real,
}

#[derive(Debug, Clone, Default)]
pub struct ModeGate {
    mode: Rc<Cell<Mode>>,
}

impl ModeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: Mode) -> Self {
        let gate = Self::new();
        gate.set_mode(mode);
        gate
    }

    /// `Fake` unless `REAL_IMAGERY` is set to anything.
    pub fn from_env() -> Self {
        Self::with_mode(env_mode())
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.set(mode);
    }

    pub fn is_fake(&self) -> bool {
        self.mode() == Mode::Fake
    }

    pub fn faked<T>(&self, f: impl FnOnce() -> T) -> T {
        self.scoped(Mode::Fake, f)
    }

    pub fn real<T>(&self, f: impl FnOnce() -> T) -> T {
        self.scoped(Mode::Real, f)
    }

    /// Runs `f(real)` under the mode `REAL_IMAGERY` selects.
    pub fn with_env_mode<T>(&self, f: impl FnOnce(bool) -> T) -> T {
        let mode = env_mode();
        self.scoped(mode, || f(mode == Mode::Real))
    }

    fn scoped<T>(&self, mode: Mode, f: impl FnOnce() -> T) -> T {
        let _restore = Restore {
            gate: self,
            previous: self.mode.replace(mode),
        };
        f()
    }
}

fn env_mode() -> Mode {
    if std::env::var_os(REAL_MODE_VAR).is_some() {
        Mode::Real
    } else {
        Mode::Fake
    }
}

struct Restore<'a> {
    gate: &'a ModeGate,
    previous: Mode,
}

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        self.gate.set_mode(self.previous);
    }
}

/// Wraps any [`Storage`] so that `save` and `delete` become no-ops in fake mode.
pub struct Faked<S: Storage> {
    inner: S,
    gate: ModeGate,
}

impl<S: Storage> Faked<S> {
    pub fn new(inner: S, gate: ModeGate) -> Self {
        Self { inner, gate }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn gate(&self) -> &ModeGate {
        &self.gate
    }
}

impl<S: Storage> Storage for Faked<S> {
    fn save(&mut self, raw: &[u8], new_identity: Option<&str>) -> Result<SaveReport> {
        if self.gate.is_fake() {
            debug!("fake mode: skipping save");
            return Ok(SaveReport::faked());
        }
        self.inner.save(raw, new_identity)
    }

    fn delete(&mut self) -> Result<()> {
        if self.gate.is_fake() {
            debug!("fake mode: skipping delete");
            return Ok(());
        }
        self.inner.delete()
    }

    fn url(&self, variant: &str) -> String {
        self.inner.url(variant)
    }

    fn identity(&self) -> Option<&str> {
        self.inner.identity()
    }
}
