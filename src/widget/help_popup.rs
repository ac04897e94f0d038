use crate::theme::Base16Palette;
use crate::widget::content_sized_rect;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const HELP_TEXT: &str = "\
Editor
  s t d h c f g v   Select, Text, Draw, Highlight, Comment, Form, Signature, Convert
  arrows            Move the page cursor
  Enter / Space     Click the page at the cursor (mouse clicks work too)
  e                 Edit the text annotation under the cursor
  Delete            Remove the annotation under the cursor
  ] / PageDown      Next page
  [ / PageUp        Previous page
  + / -             Zoom in / out
  r                 Rotate 90 degrees
  o                 Open a file
  Ctrl+s            Save
  Ctrl+d            Download a copy
  p                 Document properties
  a                 AI assistant
  x                 Developer chat
  u                 Account menu
  Tab               Focus the open chat panels
  Esc               Dismiss the newest notice
  q / Ctrl+c        Quit

Chat panels
  Tab               Move between message, API key and attachment fields
  Enter             Send, save the key, or attach the file path
  Shift+Tab         Move focus to the next panel or the page
  F2                Switch model (assistant)
  F3                Toggle code / output preview (developer)
  F5                Run the previewed code (developer)
  Esc               Close the panel

Pages
  l                 Sign in (landing page)
  t / p             Terms of Service / Privacy Policy
  j / k             Scroll
";

pub enum HelpPopupAction {
    Close,
}

pub struct HelpPopup {
    scroll_offset: usize,
    last_popup_area: Option<Rect>,
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPopup {
    pub fn new() -> Self {
        HelpPopup {
            scroll_offset: 0,
            last_popup_area: None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let max_content_width = HELP_TEXT
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(80);

        // Two columns of margin each side plus borders
        let desired_width = (max_content_width + 6).min(area.width as usize);

        let popup_area = content_sized_rect(desired_width as u16, 90, area);
        self.last_popup_area = Some(popup_area);

        f.render_widget(Clear, popup_area);

        let lines: Vec<Line> = HELP_TEXT
            .lines()
            .skip(self.scroll_offset)
            .map(|line| {
                Line::from(Span::styled(
                    format!("  {line}"),
                    Style::default().fg(palette.base_05),
                ))
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Help - Press ? or ESC to close ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, popup_area);
    }

    pub fn scroll_down(&mut self) {
        let max_lines = HELP_TEXT.lines().count();
        if self.scroll_offset < max_lines.saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    fn half_page(&self) -> usize {
        self.last_popup_area
            .map_or(10, |area| (area.height as usize / 2).max(1))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<HelpPopupAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(),
            KeyCode::Char('g') => self.scroll_offset = 0,
            KeyCode::Char('G') => {
                self.scroll_offset = HELP_TEXT.lines().count().saturating_sub(1);
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let max_lines = HELP_TEXT.lines().count();
                self.scroll_offset =
                    (self.scroll_offset + self.half_page()).min(max_lines.saturating_sub(1));
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.half_page());
            }
            KeyCode::Esc | KeyCode::Char('?') => return Some(HelpPopupAction::Close),
            _ => {}
        }
        None
    }
}
