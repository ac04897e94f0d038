use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::notification::{Notice, NoticeLevel, Notices};
use crate::theme::Base16Palette;

const MAX_VISIBLE: usize = 3;

pub fn notice_line(notice: &Notice, palette: &Base16Palette) -> Line<'static> {
    let style = match notice.level {
        NoticeLevel::Info => Style::default()
            .fg(palette.base_06)
            .bg(palette.base_02)
            .add_modifier(Modifier::BOLD),
        NoticeLevel::Success => Style::default()
            .fg(palette.base_00)
            .bg(palette.base_0b)
            .add_modifier(Modifier::BOLD),
        NoticeLevel::Error => Style::default()
            .fg(palette.base_07)
            .bg(palette.base_08)
            .add_modifier(Modifier::BOLD),
    };

    Line::from(vec![Span::styled(format!(" {} ", notice.message), style)]).right_aligned()
}

/// Newest notices stacked upward from the bottom edge of `area`
pub fn render_notices(f: &mut Frame, area: Rect, notices: &Notices, palette: &Base16Palette) {
    let visible = notices.all().iter().take(MAX_VISIBLE);
    for (i, notice) in visible.enumerate() {
        let offset = i as u16 + 1;
        if offset > area.height {
            break;
        }
        let row = Rect {
            x: area.x,
            y: area.y + area.height - offset,
            width: area.width,
            height: 1,
        };
        f.render_widget(Clear, row);
        f.render_widget(Paragraph::new(notice_line(notice, palette)), row);
    }
}
