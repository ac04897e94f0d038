//! Tool strip and status line above the page

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::editor::Editor;
use crate::theme::Base16Palette;
use crate::tool_mode::ToolMode;

pub const TOOLBAR_HEIGHT: u16 = 4;

fn tool_spans(active: ToolMode, palette: &Base16Palette) -> Vec<Span<'static>> {
    let (selected_bg, selected_fg) = palette.get_selection_colors(true);
    let mut spans = Vec::new();
    for mode in ToolMode::ALL {
        let style = if mode == active {
            Style::default()
                .fg(selected_fg)
                .bg(selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.base_04)
        };
        spans.push(Span::styled(
            format!(" [{}] {} ", mode.shortcut(), mode.label()),
            style,
        ));
    }
    spans
}

/// The document line: name, size, page, zoom, rotation
pub fn status_text(editor: &Editor) -> String {
    let view = editor.view();
    match editor.document() {
        Some(doc) => format!(
            "{} ({})  Page {}/{}  {}%  {}°",
            doc.name,
            doc.size_label(),
            view.current_page,
            view.page_count,
            view.scale_percent(),
            view.rotation
        ),
        None => "No document loaded. Press o to open a file".to_string(),
    }
}

pub fn render_toolbar(
    f: &mut Frame,
    area: Rect,
    editor: &Editor,
    user_label: Option<&str>,
    palette: &Base16Palette,
) {
    let account = user_label.map_or_else(String::new, |label| format!("[u] {label} "));
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(palette.base_03))
        .style(Style::default().bg(palette.base_01));

    let lines = vec![
        Line::from(tool_spans(editor.tool_mode(), palette)),
        Line::from(vec![
            Span::styled(
                format!(" {}", status_text(editor)),
                Style::default().fg(palette.base_06),
            ),
            Span::raw("  "),
            Span::styled(account, Style::default().fg(palette.base_0d)),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}
