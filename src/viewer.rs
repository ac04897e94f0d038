//! Page renderer state
//!
//! The renderer is fully controlled: the editor owns a [`ViewState`] and
//! drives it with [`Command`]s. Each command reports what must be redrawn.

/// Scale limits and step, in whole percent.
pub const MIN_SCALE_PERCENT: u16 = 50;
pub const MAX_SCALE_PERCENT: u16 = 300;
pub const SCALE_STEP_PERCENT: u16 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
    /// 1-based; 1 when no document is loaded
    pub current_page: usize,
    pub page_count: usize,
    scale_percent: u16,
    /// Degrees, one of 0, 90, 180, 270
    pub rotation: u16,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            scale_percent: 100,
            rotation: 0,
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f32 {
        f32::from(self.scale_percent) / 100.0
    }

    pub fn scale_percent(&self) -> u16 {
        self.scale_percent
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.page_count
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::GoToPage(page) => {
                if page >= 1 && page <= self.page_count && page != self.current_page {
                    self.current_page = page;
                    vec![Effect::RenderCurrentPage, Effect::RefreshOverlay]
                } else {
                    vec![]
                }
            }

            Command::NextPage => self.apply(Command::GoToPage(self.current_page + 1)),

            Command::PrevPage => match self.current_page.checked_sub(1) {
                Some(page) => self.apply(Command::GoToPage(page)),
                None => vec![],
            },

            Command::ZoomIn => self.set_scale(
                (self.scale_percent + SCALE_STEP_PERCENT).min(MAX_SCALE_PERCENT),
            ),

            Command::ZoomOut => self.set_scale(
                self.scale_percent
                    .saturating_sub(SCALE_STEP_PERCENT)
                    .max(MIN_SCALE_PERCENT),
            ),

            Command::Rotate => {
                self.rotation = (self.rotation + 90) % 360;
                vec![Effect::RenderCurrentPage]
            }

            Command::SetPageCount(count) => {
                self.page_count = count;
                if self.current_page > count && count > 0 {
                    self.current_page = count;
                }
                vec![Effect::RenderCurrentPage]
            }

            Command::Reset { page_count } => {
                self.page_count = page_count;
                self.current_page = 1;
                vec![Effect::RenderCurrentPage, Effect::RefreshOverlay]
            }
        }
    }

    fn set_scale(&mut self, percent: u16) -> Vec<Effect> {
        if percent == self.scale_percent {
            return vec![];
        }
        self.scale_percent = percent;
        vec![Effect::RenderCurrentPage]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    GoToPage(usize),
    NextPage,
    PrevPage,
    ZoomIn,
    ZoomOut,
    Rotate,
    SetPageCount(usize),
    /// A new document was loaded; zoom and rotation carry over
    Reset { page_count: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    RenderCurrentPage,
    /// The annotation layer must be re-filtered for the current page
    RefreshOverlay,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(pages: usize) -> ViewState {
        let mut state = ViewState::new();
        let _ = state.apply(Command::Reset { page_count: pages });
        state
    }

    #[test]
    fn zoom_steps_are_exact_and_clamped() {
        let mut state = loaded(1);
        for _ in 0..3 {
            let _ = state.apply(Command::ZoomIn);
        }
        assert_eq!(state.scale_percent(), 130);
        assert!((state.scale() - 1.3).abs() < f32::EPSILON);

        for _ in 0..8 {
            let _ = state.apply(Command::ZoomOut);
        }
        assert_eq!(state.scale_percent(), 50);
        assert!(state.apply(Command::ZoomOut).is_empty());
    }

    #[test]
    fn zoom_in_caps_at_three() {
        let mut state = loaded(1);
        for _ in 0..40 {
            let _ = state.apply(Command::ZoomIn);
        }
        assert_eq!(state.scale_percent(), MAX_SCALE_PERCENT);
    }

    #[test]
    fn rotation_wraps_at_full_turn() {
        let mut state = loaded(1);
        for _ in 0..3 {
            let _ = state.apply(Command::Rotate);
        }
        assert_eq!(state.rotation, 270);
        let _ = state.apply(Command::Rotate);
        assert_eq!(state.rotation, 0);
    }

    #[test]
    fn go_to_page_ignores_out_of_range() {
        let mut state = loaded(3);
        assert!(state.apply(Command::GoToPage(0)).is_empty());
        assert!(state.apply(Command::GoToPage(4)).is_empty());
        assert_eq!(state.current_page, 1);

        let effects = state.apply(Command::GoToPage(3));
        assert_eq!(effects, vec![Effect::RenderCurrentPage, Effect::RefreshOverlay]);
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn next_and_prev_stay_in_bounds() {
        let mut state = loaded(2);
        assert!(state.apply(Command::PrevPage).is_empty());
        let _ = state.apply(Command::NextPage);
        assert_eq!(state.current_page, 2);
        assert!(!state.has_next());
        assert!(state.apply(Command::NextPage).is_empty());
        let _ = state.apply(Command::PrevPage);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn reset_returns_to_first_page() {
        let mut state = loaded(5);
        let _ = state.apply(Command::GoToPage(4));
        let _ = state.apply(Command::ZoomIn);
        let _ = state.apply(Command::Rotate);

        let _ = state.apply(Command::Reset { page_count: 2 });
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_count, 2);
        assert_eq!(state.scale_percent(), 110);
        assert_eq!(state.rotation, 90);
    }

    #[test]
    fn shrinking_page_count_clamps_current_page() {
        let mut state = loaded(5);
        let _ = state.apply(Command::GoToPage(5));
        let _ = state.apply(Command::SetPageCount(2));
        assert_eq!(state.current_page, 2);
    }
}
