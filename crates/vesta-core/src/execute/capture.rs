//! Scoped capture of console output and pending graphics.
//!
//! Both capture points are shared slots: the engine-side hooks write into
//! them during a call, and the environment drains them exactly once when the
//! call finishes — on every exit path, including script errors.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::figure::{Chart, Figure};

/// Console text captured from `print`/`debug` during one call.
#[derive(Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line of console output.
    pub fn append_line(&self, text: &str) {
        let mut buf = self.inner.lock();
        buf.push_str(text);
        buf.push('\n');
    }

    /// Drain the buffered output, leaving the buffer empty.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.inner.lock())
    }
}

/// Latent graphics captured from a call but not yet rendered.
///
/// At most one of each kind survives a call; a later `show` overwrites an
/// earlier one.
#[derive(Debug, Default)]
pub struct PendingGraphic {
    pub raster: Option<Figure>,
    pub interactive: Option<Chart>,
}

impl PendingGraphic {
    pub fn is_empty(&self) -> bool {
        self.raster.is_none() && self.interactive.is_none()
    }
}

/// Shared slot the installed `show` hooks write into.
#[derive(Clone, Default)]
pub struct GraphicSlot {
    inner: Arc<Mutex<PendingGraphic>>,
}

impl GraphicSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a raster figure as ready. Last write wins.
    pub fn stash_raster(&self, figure: Figure) {
        self.inner.lock().raster = Some(figure);
    }

    /// Stash an interactive chart. Last write wins.
    pub fn stash_interactive(&self, chart: Chart) {
        self.inner.lock().interactive = Some(chart);
    }

    /// Consume and clear the pending state.
    pub fn drain(&self) -> PendingGraphic {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
