use gpui::{Bounds, Pixels, Point, Size, point, px};
use gpui_component::VirtualListScrollHandle;

/// Distance from the tail within which the viewport still counts as "at
/// bottom" when deciding whether an append may scroll.
const BOTTOM_TOLERANCE: Pixels = px(10.);

/// Manages panel scroll position around appends.
///
/// The policy is asymmetric on purpose: a sent user message snaps the panel
/// down only when the viewport already sat at the bottom, the typing
/// placeholder always snaps down, and a received bot message never moves the
/// viewport, so reading upward history is never interrupted by a reply.
pub struct ScrollManager {
    scroll_handle: VirtualListScrollHandle,
    pending_scroll_to_bottom: bool,
    last_scroll_offset: Pixels,
    last_max_offset: Pixels,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: VirtualListScrollHandle::new(),
            pending_scroll_to_bottom: false,
            last_scroll_offset: Pixels::ZERO,
            last_max_offset: Pixels::ZERO,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.scroll_handle
    }

    /// Queues an unconditional scroll to the tail (typing placeholder).
    pub fn request_scroll_to_bottom(&mut self) {
        self.pending_scroll_to_bottom = true;
    }

    /// Queues a scroll to the tail only when the viewport was at the bottom
    /// before the content changed (user message append).
    pub fn request_scroll_if_at_bottom(&mut self) {
        if self.was_at_bottom() {
            self.pending_scroll_to_bottom = true;
        }
    }

    pub fn reset(&mut self) {
        self.last_scroll_offset = Pixels::ZERO;
        self.last_max_offset = Pixels::ZERO;
        self.pending_scroll_to_bottom = true;
    }

    /// Records the offsets the user actually sees, so the next append can
    /// judge "was at bottom" against the pre-append viewport.
    pub fn track_offsets(&mut self) {
        self.last_scroll_offset = self.scroll_handle.offset().y;
        self.last_max_offset = self.scroll_handle.max_offset().height;
    }

    /// Applies a queued scroll request, if any. The offset is set directly,
    /// with no animation, and the request is consumed either way.
    pub fn apply_pending_scroll(&mut self) -> bool {
        let should_scroll = self.pending_scroll_to_bottom;

        if should_scroll {
            let max_offset = self.scroll_handle.max_offset().height;
            let current_x = self.scroll_handle.offset().x;
            let target_y = if max_offset > Pixels::ZERO {
                -max_offset
            } else {
                Pixels::ZERO
            };
            self.scroll_handle.set_offset(point(current_x, target_y));
        }

        self.pending_scroll_to_bottom = false;
        should_scroll
    }

    pub fn bounds(&self) -> Bounds<Pixels> {
        self.scroll_handle.bounds()
    }

    pub fn offset(&self) -> Point<Pixels> {
        self.scroll_handle.offset()
    }

    pub fn max_offset(&self) -> Size<Pixels> {
        self.scroll_handle.max_offset()
    }

    fn was_at_bottom(&self) -> bool {
        let max_offset = self.last_max_offset;
        if max_offset <= Pixels::ZERO {
            return true;
        }

        // GPUI uses negative Y offsets for scrolling down, so `offset + max`
        // approaches 0 at the tail.
        let offset = self.last_scroll_offset;
        (offset + max_offset).abs() <= BOTTOM_TOLERANCE
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}
