use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::pages::StaticPage;
use crate::theme::Base16Palette;

fn page_lines(page: &StaticPage, intro: Option<&str>, palette: &Base16Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(intro) = intro {
        lines.push(Line::from(Span::styled(
            intro.to_string(),
            Style::default().fg(palette.base_05),
        )));
        lines.push(Line::from(""));
    }
    for section in page.sections {
        lines.push(Line::from(Span::styled(
            section.heading,
            Style::default()
                .fg(palette.base_0d)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            section.body,
            Style::default().fg(palette.base_05),
        )));
        lines.push(Line::from(""));
    }
    lines
}

/// A scrollable text page with a one-line key hint at the bottom
pub fn render_static_page(
    f: &mut Frame,
    area: Rect,
    page: &StaticPage,
    intro: Option<&str>,
    scroll: u16,
    hint: &str,
    palette: &Base16Palette,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let body = Paragraph::new(page_lines(page, intro, palette))
        .block(
            Block::default()
                .title(format!(" {} ", page.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0c))
                .style(Style::default().bg(palette.base_00)),
        )
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));
    f.render_widget(body, chunks[0]);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {hint}"),
            Style::default().fg(palette.base_03),
        ))),
        chunks[1],
    );
}
