//! Display surface abstraction
//!
//! The surface shows an ordered list of rendered messages plus at most one
//! transient typing placeholder. The core only ever appends, clears back to
//! the welcome entry, and toggles the placeholder.

use crate::input::InputView;
use crate::render::RenderedMessage;
use std::sync::{Arc, Mutex, MutexGuard};

pub trait DisplaySurface: Send {
    fn append(&mut self, message: RenderedMessage);

    /// Drop everything but the first (welcome) entry
    fn clear_to_welcome(&mut self);

    fn show_typing(&mut self);

    fn hide_typing(&mut self);

    fn scroll_to_latest(&mut self);

    fn update_input(&mut self, view: &InputView);

    /// Entries currently on the surface, in display order
    fn rendered(&self) -> Vec<RenderedMessage>;
}

/// In-memory surface. Clones share the same state, so a caller can keep one
/// to observe what the runtime displays.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    inner: Arc<Mutex<SurfaceState>>,
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    pub entries: Vec<RenderedMessage>,
    pub typing: bool,
    pub input: Option<InputView>,
    pub scrolls: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SurfaceState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl DisplaySurface for MemorySurface {
    fn append(&mut self, message: RenderedMessage) {
        self.lock().entries.push(message);
    }

    fn clear_to_welcome(&mut self) {
        self.lock().entries.truncate(1);
    }

    fn show_typing(&mut self) {
        self.lock().typing = true;
    }

    fn hide_typing(&mut self) {
        self.lock().typing = false;
    }

    fn scroll_to_latest(&mut self) {
        self.lock().scrolls += 1;
    }

    fn update_input(&mut self, view: &InputView) {
        self.lock().input = Some(view.clone());
    }

    fn rendered(&self) -> Vec<RenderedMessage> {
        self.lock().entries.clone()
    }
}
