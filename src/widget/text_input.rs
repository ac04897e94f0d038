//! Single-line text field used by every form in the app

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::Base16Palette;

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars
    cursor: usize,
    masked: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field that renders its contents as `*`
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set(value);
        input
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Hand the contents out and leave the field empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// Apply an editing key. Returns false for keys the field does not use,
    /// so the caller can treat them as commands.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('u') => {
                    self.clear();
                    true
                }
                _ => false,
            };
        }

        let len = self.value.chars().count();
        match key.code {
            KeyCode::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            _ => return false,
        }
        true
    }

    fn shown(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// `label: value` with a block cursor when focused
    pub fn line(&self, label: &str, focused: bool, palette: &Base16Palette) -> Line<'static> {
        let (text_color, border_color, _) = palette.get_panel_colors(focused);
        let mut spans = vec![Span::styled(
            format!("{label}: "),
            Style::default().fg(border_color),
        )];

        let shown = self.shown();
        if focused {
            let split = shown
                .char_indices()
                .nth(self.cursor)
                .map_or(shown.len(), |(i, _)| i);
            let (before, rest) = shown.split_at(split);
            let mut rest = rest.chars();
            let under = rest.next().map_or(" ".to_string(), |c| c.to_string());
            spans.push(Span::styled(before.to_string(), Style::default().fg(text_color)));
            spans.push(Span::styled(
                under,
                Style::default()
                    .fg(palette.base_00)
                    .bg(palette.base_06)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                rest.collect::<String>(),
                Style::default().fg(text_color),
            ));
        } else {
            spans.push(Span::styled(shown, Style::default().fg(text_color)));
        }
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn edits_at_the_cursor() {
        let mut input = TextInput::with_value("helo");
        input.handle_key(key(KeyCode::Left));
        input.handle_key(key(KeyCode::Char('l')));
        assert_eq!(input.value(), "hello");

        input.handle_key(key(KeyCode::Home));
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.value(), "ello");

        input.handle_key(key(KeyCode::End));
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "ell");
    }

    #[test]
    fn handles_multibyte_chars() {
        let mut input = TextInput::new();
        for c in "héé".chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "hé");
    }

    #[test]
    fn command_keys_are_not_consumed() {
        let mut input = TextInput::new();
        assert!(!input.handle_key(key(KeyCode::Enter)));
        assert!(!input.handle_key(key(KeyCode::Tab)));
        assert!(!input.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn take_empties_the_field() {
        let mut input = TextInput::with_value("draft");
        assert_eq!(input.take(), "draft");
        assert!(input.is_empty());
    }

    #[test]
    fn masked_field_hides_text() {
        let mut input = TextInput::masked();
        input.set("secret");
        let line = input.line("Password", false, &crate::theme::OCEANIC_NEXT);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "Password: ******");
    }
}
