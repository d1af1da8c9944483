//! Reader state for the page viewer.
//!
//! Owned by whatever renders the viewer and passed to its event handlers.
//! Pages are 1-based here, matching what the reader displays.

/// Smallest zoom factor reachable with the wheel.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom factor reachable with the wheel.
pub const MAX_ZOOM: f64 = 5.0;
/// Zoom change per wheel notch.
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingDirection {
    LeftToRight,
    /// Manga order: the second page of a spread sits on the left
    #[default]
    RightToLeft,
}

/// Flex order of the two page slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOrder {
    Row,
    RowReverse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    current_page: usize,
    total_pages: usize,
    zoom: f64,
    pan: (f64, f64),
    auto_fit: bool,
    dual_page: bool,
    cover_offset: bool,
    direction: ReadingDirection,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ViewerState {
    pub fn new(total_pages: usize) -> Self {
        Self {
            current_page: if total_pages > 0 { 1 } else { 0 },
            total_pages,
            zoom: 1.0,
            pan: (0.0, 0.0),
            auto_fit: true,
            dual_page: false,
            cover_offset: false,
            direction: ReadingDirection::default(),
        }
    }

    /// Start over on a freshly loaded collection. Layout modes are kept.
    pub fn reset_for(&mut self, total_pages: usize) {
        self.total_pages = total_pages;
        self.current_page = if total_pages > 0 { 1 } else { 0 };
        self.recenter();
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// 0-based index of the current page into the collection.
    pub fn current_index(&self) -> Option<usize> {
        self.current_page.checked_sub(1)
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Jump to a page. Out-of-range requests are ignored and return `false`.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Advance one page, or one spread in dual-page mode.
    pub fn next_page(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        // With a cover offset page 1 stands alone, so 1 -> 2 is a single step.
        let step = match (self.dual_page, self.cover_offset) {
            (false, _) => 1,
            (true, true) if self.current_page == 1 => 1,
            (true, _) => 2,
        };
        self.go_to_page((self.current_page + step).min(self.total_pages))
    }

    /// Go back one page, or one spread in dual-page mode.
    pub fn previous_page(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        let step = match (self.dual_page, self.cover_offset) {
            (false, _) => 1,
            (true, true) if self.current_page == 2 => 1,
            (true, _) => 2,
        };
        self.go_to_page(self.current_page.saturating_sub(step).max(1))
    }

    /// Pages on screen: the current one and, in dual-page mode, its partner.
    pub fn visible_pages(&self) -> (usize, Option<usize>) {
        let has_next = self.current_page < self.total_pages;
        let show_second = self.dual_page
            && has_next
            && (!self.cover_offset || self.current_page % 2 == 0);

        let second = if show_second {
            Some(self.current_page + 1)
        } else {
            None
        };
        (self.current_page, second)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Apply one wheel notch. Scrolling down zooms out. Returns whether zoom changed.
    pub fn zoom_by_wheel(&mut self, delta_y: f64) -> bool {
        let delta = if delta_y > 0.0 { -ZOOM_STEP } else { ZOOM_STEP };
        let zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        self.zoom = zoom;
        true
    }

    /// Display size of a page at the current zoom, or `None` at 100%,
    /// where the page is simply fitted into the viewport.
    pub fn scaled_size(&self, natural: Size) -> Option<Size> {
        if (self.zoom - 1.0).abs() < f64::EPSILON {
            return None;
        }
        Some(Size::new(natural.width * self.zoom, natural.height * self.zoom))
    }

    pub fn pan(&self) -> (f64, f64) {
        self.pan
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.0 += dx;
        self.pan.1 += dy;
    }

    /// Back to 100% and centered.
    pub fn recenter(&mut self) {
        self.zoom = 1.0;
        self.pan = (0.0, 0.0);
    }

    /// Zoom so the visible page(s) fit the viewport, never enlarging past 100%.
    ///
    /// The secondary page only counts in dual-page mode. Returns the new zoom,
    /// or `None` when the primary page has no size yet.
    pub fn fit_to_screen(
        &mut self,
        viewport: Size,
        primary: Size,
        secondary: Option<Size>,
    ) -> Option<f64> {
        if primary.width <= 0.0 || primary.height <= 0.0 {
            return None;
        }

        let mut total_width = primary.width;
        if self.dual_page {
            if let Some(second) = secondary {
                total_width += second.width;
            }
        }

        let scale_x = viewport.width / total_width;
        let scale_y = viewport.height / primary.height;
        self.zoom = scale_x.min(scale_y).min(1.0);
        self.pan = (0.0, 0.0);
        Some(self.zoom)
    }

    pub fn auto_fit(&self) -> bool {
        self.auto_fit
    }

    pub fn toggle_auto_fit(&mut self) -> bool {
        self.auto_fit = !self.auto_fit;
        self.auto_fit
    }

    pub fn dual_page(&self) -> bool {
        self.dual_page
    }

    pub fn toggle_dual_page(&mut self) -> bool {
        self.dual_page = !self.dual_page;
        self.dual_page
    }

    pub fn cover_offset(&self) -> bool {
        self.cover_offset
    }

    pub fn toggle_cover_offset(&mut self) -> bool {
        self.cover_offset = !self.cover_offset;
        self.cover_offset
    }

    pub fn direction(&self) -> ReadingDirection {
        self.direction
    }

    pub fn toggle_direction(&mut self) -> ReadingDirection {
        self.direction = match self.direction {
            ReadingDirection::LeftToRight => ReadingDirection::RightToLeft,
            ReadingDirection::RightToLeft => ReadingDirection::LeftToRight,
        };
        self.direction
    }

    /// Reversed only for a right-to-left spread.
    pub fn display_order(&self) -> DisplayOrder {
        if self.dual_page && self.direction == ReadingDirection::RightToLeft {
            DisplayOrder::RowReverse
        } else {
            DisplayOrder::Row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_navigation() {
        let mut state = ViewerState::new(3);
        assert_eq!(state.current_page(), 1);
        assert!(!state.previous_page());
        assert!(state.next_page());
        assert!(state.next_page());
        assert_eq!(state.current_page(), 3);
        assert!(!state.next_page());
        assert!(state.previous_page());
        assert_eq!(state.current_index(), Some(1));
    }

    #[test]
    fn test_go_to_page_rejects_out_of_range() {
        let mut state = ViewerState::new(5);
        assert!(!state.go_to_page(0));
        assert!(!state.go_to_page(6));
        assert_eq!(state.current_page(), 1);
        assert!(state.go_to_page(5));
        assert_eq!(state.current_page(), 5);
    }

    #[test]
    fn test_empty_collection() {
        let mut state = ViewerState::new(0);
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.current_index(), None);
        assert!(!state.next_page());
        assert!(!state.previous_page());
    }

    #[test]
    fn test_dual_page_pairs_from_start() {
        let mut state = ViewerState::new(5);
        state.toggle_dual_page();

        assert_eq!(state.visible_pages(), (1, Some(2)));
        state.next_page();
        assert_eq!(state.visible_pages(), (3, Some(4)));
        state.next_page();
        assert_eq!(state.visible_pages(), (5, None));
        state.previous_page();
        assert_eq!(state.current_page(), 3);
    }

    #[test]
    fn test_dual_page_with_cover_offset() {
        let mut state = ViewerState::new(6);
        state.toggle_dual_page();
        state.toggle_cover_offset();

        assert_eq!(state.visible_pages(), (1, None));
        state.next_page();
        assert_eq!(state.visible_pages(), (2, Some(3)));
        state.next_page();
        assert_eq!(state.visible_pages(), (4, Some(5)));
        state.next_page();
        assert_eq!(state.visible_pages(), (6, None));

        state.go_to_page(2);
        state.previous_page();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let mut state = ViewerState::new(1);
        assert!(state.zoom_by_wheel(-1.0));
        assert_eq!(state.zoom_percent(), 110);

        for _ in 0..100 {
            state.zoom_by_wheel(-1.0);
        }
        assert!((state.zoom() - MAX_ZOOM).abs() < 1e-9);
        assert!(!state.zoom_by_wheel(-1.0));

        for _ in 0..100 {
            state.zoom_by_wheel(1.0);
        }
        assert!((state.zoom() - MIN_ZOOM).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_screen() {
        let mut state = ViewerState::new(2);
        state.pan_by(10.0, -4.0);

        let zoom = state
            .fit_to_screen(Size::new(800.0, 600.0), Size::new(1000.0, 1500.0), None)
            .unwrap();
        assert!((zoom - 0.4).abs() < 1e-9);
        assert_eq!(state.pan(), (0.0, 0.0));

        // Never enlarges small pages
        let zoom = state
            .fit_to_screen(Size::new(800.0, 600.0), Size::new(100.0, 100.0), None)
            .unwrap();
        assert!((zoom - 1.0).abs() < 1e-9);
        assert!(state.scaled_size(Size::new(100.0, 100.0)).is_none());

        // Secondary width only counts in dual-page mode
        let spread = Some(Size::new(400.0, 300.0));
        state.fit_to_screen(Size::new(400.0, 1000.0), Size::new(400.0, 300.0), spread);
        assert!((state.zoom() - 1.0).abs() < 1e-9);
        state.toggle_dual_page();
        state.fit_to_screen(Size::new(400.0, 1000.0), Size::new(400.0, 300.0), spread);
        assert!((state.zoom() - 0.5).abs() < 1e-9);

        assert!(state
            .fit_to_screen(Size::new(400.0, 400.0), Size::new(0.0, 0.0), None)
            .is_none());
    }

    #[test]
    fn test_recenter_and_reset() {
        let mut state = ViewerState::new(4);
        state.toggle_dual_page();
        state.zoom_by_wheel(-1.0);
        state.pan_by(5.0, 5.0);
        state.go_to_page(3);

        state.reset_for(2);
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.total_pages(), 2);
        assert_eq!(state.zoom(), 1.0);
        assert_eq!(state.pan(), (0.0, 0.0));
        assert!(state.dual_page());
    }

    #[test]
    fn test_display_order() {
        let mut state = ViewerState::new(2);
        assert_eq!(state.display_order(), DisplayOrder::Row);
        state.toggle_dual_page();
        assert_eq!(state.display_order(), DisplayOrder::RowReverse);
        assert_eq!(state.toggle_direction(), ReadingDirection::LeftToRight);
        assert_eq!(state.display_order(), DisplayOrder::Row);
    }
}
