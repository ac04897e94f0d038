//! Tool mode controller
//!
//! Records the active tool and decides what a click on the page canvas
//! does. `Convert` is not a sticky mode: choosing it asks for the
//! conversion dialog and the controller falls back to `Select`.

use crate::annotation::PagePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    Text,
    Draw,
    Highlight,
    Comment,
    Form,
    Signature,
    Convert,
}

impl ToolMode {
    pub const ALL: [ToolMode; 8] = [
        ToolMode::Select,
        ToolMode::Text,
        ToolMode::Draw,
        ToolMode::Highlight,
        ToolMode::Comment,
        ToolMode::Form,
        ToolMode::Signature,
        ToolMode::Convert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolMode::Select => "select",
            ToolMode::Text => "text",
            ToolMode::Draw => "draw",
            ToolMode::Highlight => "highlight",
            ToolMode::Comment => "comment",
            ToolMode::Form => "form",
            ToolMode::Signature => "signature",
            ToolMode::Convert => "convert",
        }
    }

    /// Toolbar label
    pub fn label(&self) -> &'static str {
        match self {
            ToolMode::Select => "Select",
            ToolMode::Text => "Text Edit",
            ToolMode::Draw => "Draw",
            ToolMode::Highlight => "Highlight",
            ToolMode::Comment => "Comment",
            ToolMode::Form => "Form",
            ToolMode::Signature => "Signature",
            ToolMode::Convert => "Convert",
        }
    }

    /// Toolbar shortcut key
    pub fn shortcut(&self) -> char {
        match self {
            ToolMode::Select => 's',
            ToolMode::Text => 't',
            ToolMode::Draw => 'd',
            ToolMode::Highlight => 'h',
            ToolMode::Comment => 'c',
            ToolMode::Form => 'f',
            ToolMode::Signature => 'g',
            ToolMode::Convert => 'v',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.shortcut() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolChange {
    /// The mode in effect after the change
    pub mode: ToolMode,
    pub open_converter: bool,
    pub notice: String,
}

/// What the editor should do in response to a canvas click
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    AddHighlight { page: usize, at: PagePoint },
    /// Ask for comment text; add a comment only if the answer is non-empty
    PromptComment { page: usize, at: PagePoint },
    OpenTextEditor { page: usize, at: PagePoint },
    None,
}

#[derive(Debug, Default)]
pub struct ToolController {
    mode: ToolMode,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn select(&mut self, mode: ToolMode) -> ToolChange {
        let notice = format!("Tool selected: {}", mode.as_str());
        if mode == ToolMode::Convert {
            self.mode = ToolMode::Select;
            return ToolChange {
                mode: self.mode,
                open_converter: true,
                notice,
            };
        }
        self.mode = mode;
        ToolChange {
            mode,
            open_converter: false,
            notice,
        }
    }

    pub fn dispatch_click(&self, page: usize, at: PagePoint) -> CanvasAction {
        match self.mode {
            ToolMode::Highlight => CanvasAction::AddHighlight { page, at },
            ToolMode::Comment => CanvasAction::PromptComment { page, at },
            ToolMode::Text => CanvasAction::OpenTextEditor { page, at },
            ToolMode::Select
            | ToolMode::Draw
            | ToolMode::Form
            | ToolMode::Signature
            | ToolMode::Convert => CanvasAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_select() {
        assert_eq!(ToolController::new().mode(), ToolMode::Select);
    }

    #[test]
    fn convert_opens_dialog_and_reverts() {
        let mut tools = ToolController::new();
        tools.select(ToolMode::Highlight);

        let change = tools.select(ToolMode::Convert);
        assert!(change.open_converter);
        assert_eq!(change.mode, ToolMode::Select);
        assert_eq!(tools.mode(), ToolMode::Select);
    }

    #[test]
    fn selection_is_announced() {
        let mut tools = ToolController::new();
        let change = tools.select(ToolMode::Comment);
        assert_eq!(change.notice, "Tool selected: comment");
        assert!(!change.open_converter);
    }

    #[test]
    fn only_annotating_modes_act_on_click() {
        let mut tools = ToolController::new();
        let at = PagePoint::new(3.0, 4.0);
        for mode in ToolMode::ALL {
            tools.select(mode);
            let action = tools.dispatch_click(2, at);
            match tools.mode() {
                ToolMode::Highlight => {
                    assert_eq!(action, CanvasAction::AddHighlight { page: 2, at })
                }
                ToolMode::Comment => {
                    assert_eq!(action, CanvasAction::PromptComment { page: 2, at })
                }
                ToolMode::Text => {
                    assert_eq!(action, CanvasAction::OpenTextEditor { page: 2, at })
                }
                _ => assert_eq!(action, CanvasAction::None),
            }
        }
    }

    #[test]
    fn shortcuts_are_unique() {
        for mode in ToolMode::ALL {
            assert_eq!(ToolMode::from_shortcut(mode.shortcut()), Some(mode));
        }
    }
}
