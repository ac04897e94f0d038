pub mod chat_panel;
pub mod dialogs;
pub mod help_popup;
pub mod login_form;
pub mod notice_stack;
pub mod page_canvas;
pub mod static_page;
pub mod text_input;
pub mod toolbar;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Fixed-width popup centred horizontally, `percent_y` of the height
pub fn content_sized_rect(width: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let available_width = r.width;
    let width = width.min(available_width);
    let margin = (available_width.saturating_sub(width)) / 2;

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(width),
            Constraint::Length(margin),
        ])
        .split(popup_layout[1])[1]
}

/// Popup of exactly `height` rows (clamped), centred in `r`
pub fn fixed_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}
