use crate::constants::MOBILE_BREAKPOINT_PX;

/// Sidebar has two independent axes: the persisted desktop collapse and the
/// session-only mobile drawer.  The drawer can only be open at or below the
/// mobile breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidebarState {
    collapsed: bool,
    mobile_open: bool,
}

pub fn is_mobile(viewport_width: f64) -> bool {
    viewport_width <= MOBILE_BREAKPOINT_PX
}

impl SidebarState {
    pub fn new(collapsed: bool) -> Self {
        Self {
            collapsed,
            mobile_open: false,
        }
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn mobile_open(&self) -> bool {
        self.mobile_open
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    /// Returns the new collapse state (the value to persist).
    pub fn toggle_collapsed(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        self.collapsed
    }

    pub fn toggle_mobile(&mut self, viewport_width: f64) -> bool {
        self.mobile_open = is_mobile(viewport_width) && !self.mobile_open;
        self.mobile_open
    }

    pub fn click_outside(&mut self, viewport_width: f64) {
        if is_mobile(viewport_width) {
            self.mobile_open = false;
        }
    }

    /// Called after the resize debounce settles.
    pub fn resized(&mut self, viewport_width: f64) {
        if !is_mobile(viewport_width) {
            self.mobile_open = false;
        }
    }
}
