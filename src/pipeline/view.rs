use std::sync::{Arc, Mutex};

/// Observable state the pipeline writes and a display layer reads. Carries no
/// knowledge of any UI binding; the display side polls snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Raw-depth extremes across the whole grid, for display scaling.
    pub display_min: u16,
    pub display_max: u16,
    /// Last pointer position reported by the input layer, in grid coordinates.
    pub pointer: Option<(f32, f32)>,
    /// Blob count reported by the tracker on the last completed tick.
    pub blob_count: usize,
    /// True while the boundary is undefined and the pipeline renders the
    /// plain normalized grid instead of tracking.
    pub degraded: bool,
    /// True when the last tick had more blobs than overlay colors.
    pub palette_exhausted: bool,
}

/// Cheap shared handle onto the view state.
#[derive(Clone, Default)]
pub struct ViewStateHandle {
    inner: Arc<Mutex<ViewState>>,
}

impl ViewStateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.lock().expect("view state lock poisoned").clone()
    }

    pub fn set_pointer(&self, x: f32, y: f32) {
        self.update(|state| state.pointer = Some((x, y)));
    }

    pub(crate) fn update(&self, apply: impl FnOnce(&mut ViewState)) {
        let mut state = self.inner.lock().expect("view state lock poisoned");
        apply(&mut state);
    }
}
