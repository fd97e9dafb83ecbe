#![forbid(unsafe_code)]

//! Constant-time viewport window calculation for large-list virtualization.
//!
//! Rendering ten thousand rows is pointless when a dozen fit on screen.
//! [`window_for`] maps scroll position and sizes to the small index range
//! actually worth rendering, in O(1), with a 2-row overscan so fast
//! scrolling does not flicker at the edges.

/// Half-open index range `[start, end)` of rows to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualWindow {
    /// First index to render (inclusive).
    pub start: usize,
    /// Last index to render (exclusive), clamped to the item count.
    pub end: usize,
}

impl VirtualWindow {
    /// Number of rows in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Rows rendered beyond the strict viewport to mask scroll flicker.
pub const OVERSCAN_ROWS: usize = 2;

/// Compute the render window for a uniform-height list.
///
/// `start = floor(scroll_offset / item_height)`, visible count rounds up so
/// a partial row at the bottom still renders, and the end is clamped to
/// `item_count` after adding [`OVERSCAN_ROWS`]. Degenerate inputs (zero
/// item height or container) yield an empty window rather than dividing by
/// zero.
#[must_use]
pub fn window_for(
    item_count: usize,
    item_height: f64,
    container_height: f64,
    scroll_offset: f64,
) -> VirtualWindow {
    if item_height <= 0.0 || container_height <= 0.0 || item_count == 0 {
        return VirtualWindow { start: 0, end: 0 };
    }

    let start = (scroll_offset.max(0.0) / item_height).floor() as usize;
    let visible = (container_height / item_height).ceil() as usize;
    let end = item_count.min(start.saturating_add(visible + OVERSCAN_ROWS));
    let start = start.min(end);
    VirtualWindow { start, end }
}

/// Caches the last computed window so dependent rendering can skip work.
///
/// Scrolling a few pixels usually maps to the same index range; `update`
/// reports whether the range actually changed and always returns the
/// current window, so callers re-render only on `true`.
#[derive(Debug, Clone, Default)]
pub struct VirtualWindowCache {
    current: Option<VirtualWindow>,
}

impl VirtualWindowCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute; returns `(window, changed)`.
    pub fn update(
        &mut self,
        item_count: usize,
        item_height: f64,
        container_height: f64,
        scroll_offset: f64,
    ) -> (VirtualWindow, bool) {
        let window = window_for(item_count, item_height, container_height, scroll_offset);
        let changed = self.current != Some(window);
        if changed {
            self.current = Some(window);
        }
        (window, changed)
    }

    /// The last computed window, if any.
    #[must_use]
    pub fn current(&self) -> Option<VirtualWindow> {
        self.current
    }
}
