//! Side panels for the AI assistant and the developer chat

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::chat::{
    AiModel, AssistantChat, ChatAttachment, CodeLanguage, DeveloperChat, Message, PreviewMode,
    Role,
};
use crate::theme::Base16Palette;
use crate::widget::fixed_rect;
use crate::widget::text_input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Assistant,
    Developer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFocus {
    Message,
    ApiKey,
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPanelAction {
    Send(String),
    SetApiKey(String),
    /// A file path typed into the attachment field
    Attach(String),
    SwitchModel,
    TogglePreview,
    RunCode,
    PickLanguage(CodeLanguage),
    DismissLanguage,
    Close,
}

pub struct ChatPanel {
    kind: ChatKind,
    message: TextInput,
    api_key: TextInput,
    attachment: TextInput,
    attachments: Vec<ChatAttachment>,
    focus: ChatFocus,
    language_state: ListState,
}

impl ChatPanel {
    pub fn new(kind: ChatKind) -> Self {
        let mut language_state = ListState::default();
        let default_language = CodeLanguage::ALL
            .iter()
            .position(|l| *l == CodeLanguage::default());
        language_state.select(default_language);
        Self {
            kind,
            message: TextInput::new(),
            api_key: TextInput::masked(),
            attachment: TextInput::new(),
            attachments: Vec::new(),
            // Nothing can be sent until a key is entered
            focus: ChatFocus::ApiKey,
            language_state,
        }
    }

    pub fn kind(&self) -> ChatKind {
        self.kind
    }

    pub fn focus(&self) -> ChatFocus {
        self.focus
    }

    pub fn attachments(&self) -> &[ChatAttachment] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, attachment: ChatAttachment) {
        self.attachments.push(attachment);
    }

    /// The message went out: clear the draft and the picked files
    pub fn sent(&mut self) {
        self.message.clear();
        self.attachments.clear();
    }

    /// Key stored; move on to writing the message
    pub fn key_saved(&mut self) {
        self.focus = ChatFocus::Message;
    }

    fn cycle_focus(&mut self) {
        self.focus = match (self.kind, self.focus) {
            (_, ChatFocus::ApiKey) => ChatFocus::Message,
            (ChatKind::Assistant, ChatFocus::Message) => ChatFocus::Attachment,
            (ChatKind::Developer, ChatFocus::Message) => ChatFocus::ApiKey,
            (_, ChatFocus::Attachment) => ChatFocus::ApiKey,
        };
    }

    fn handle_language_key(&mut self, key: KeyEvent) -> Option<ChatPanelAction> {
        let len = CodeLanguage::ALL.len();
        let current = self.language_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.language_state.select(Some((current + 1) % len));
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.language_state
                    .select(Some(current.checked_sub(1).unwrap_or(len - 1)));
                None
            }
            KeyCode::Enter => CodeLanguage::ALL
                .get(current)
                .map(|lang| ChatPanelAction::PickLanguage(*lang)),
            KeyCode::Esc => Some(ChatPanelAction::DismissLanguage),
            _ => None,
        }
    }

    /// `choosing_language` routes keys to the developer chat's language list
    pub fn handle_key(&mut self, key: KeyEvent, choosing_language: bool) -> Option<ChatPanelAction> {
        if choosing_language {
            return self.handle_language_key(key);
        }

        match key.code {
            KeyCode::Esc => return Some(ChatPanelAction::Close),
            KeyCode::Tab => {
                self.cycle_focus();
                return None;
            }
            KeyCode::F(2) if self.kind == ChatKind::Assistant => {
                return Some(ChatPanelAction::SwitchModel);
            }
            KeyCode::F(3) if self.kind == ChatKind::Developer => {
                return Some(ChatPanelAction::TogglePreview);
            }
            KeyCode::F(5) if self.kind == ChatKind::Developer => {
                return Some(ChatPanelAction::RunCode);
            }
            _ => {}
        }

        match (self.focus, key.code) {
            (ChatFocus::Message, KeyCode::Enter) => {
                Some(ChatPanelAction::Send(self.message.value().to_string()))
            }
            (ChatFocus::ApiKey, KeyCode::Enter) => {
                Some(ChatPanelAction::SetApiKey(self.api_key.value().trim().to_string()))
            }
            (ChatFocus::Attachment, KeyCode::Enter) => {
                let path = self.attachment.take();
                let path = path.trim();
                (!path.is_empty()).then(|| ChatPanelAction::Attach(path.to_string()))
            }
            (ChatFocus::Attachment, KeyCode::Backspace) if self.attachment.is_empty() => {
                self.attachments.pop();
                None
            }
            (ChatFocus::Message, _) => {
                self.message.handle_key(key);
                None
            }
            (ChatFocus::ApiKey, _) => {
                self.api_key.handle_key(key);
                None
            }
            (ChatFocus::Attachment, _) => {
                self.attachment.handle_key(key);
                None
            }
        }
    }

    fn panel_block(&self, title: String, focused: bool, palette: &Base16Palette) -> Block<'static> {
        let (_, border, bg) = palette.get_panel_colors(focused);
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(bg))
    }

    /// Transcript lines pre-wrapped to `width` so scrolling can count rows
    fn transcript(
        messages: &[Message],
        assistant_name: &str,
        width: usize,
        palette: &Base16Palette,
    ) -> Vec<Line<'static>> {
        let width = width.max(1);
        let text_style = Style::default().fg(palette.base_05);
        let mut lines = Vec::new();
        for message in messages {
            let (who, color) = match message.role {
                Role::User => ("You", palette.base_0b),
                Role::Assistant => (assistant_name, palette.base_0d),
            };
            let prefix = format!("{who}: ");
            let body = format!("{prefix}{}", message.content);
            for (i, row) in textwrap::wrap(&body, width).into_iter().enumerate() {
                match row.strip_prefix(prefix.as_str()) {
                    Some(rest) if i == 0 => lines.push(Line::from(vec![
                        Span::styled(
                            prefix.clone(),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(rest.to_string(), text_style),
                    ])),
                    _ => lines.push(Line::from(Span::styled(row.to_string(), text_style))),
                }
            }
            if !message.files.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  files: {}", message.files.join(", ")),
                    Style::default().fg(palette.base_03),
                )));
            }
            if let Some(code) = &message.code {
                lines.push(Line::from(Span::styled(
                    format!("```{}", code.language),
                    Style::default().fg(palette.base_03),
                )));
                for code_line in code.content.lines() {
                    lines.push(Line::from(Span::styled(
                        code_line.to_string(),
                        Style::default().fg(palette.base_0a),
                    )));
                }
                lines.push(Line::from(Span::styled(
                    "```",
                    Style::default().fg(palette.base_03),
                )));
            }
            lines.push(Line::from(""));
        }
        lines
    }

    fn render_transcript(
        f: &mut Frame,
        area: Rect,
        mut lines: Vec<Line<'static>>,
        waiting: bool,
        palette: &Base16Palette,
    ) {
        if waiting {
            lines.push(Line::from(Span::styled(
                "Thinking...",
                Style::default()
                    .fg(palette.base_0a)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        // Keep the newest messages in view
        let overflow = lines.len().saturating_sub(area.height as usize);
        let paragraph =
            Paragraph::new(lines).scroll((overflow.min(u16::MAX as usize) as u16, 0));
        f.render_widget(paragraph, area);
    }

    pub fn render_assistant(
        &self,
        f: &mut Frame,
        area: Rect,
        chat: &AssistantChat,
        focused: bool,
        palette: &Base16Palette,
    ) {
        let model: AiModel = chat.model();
        let block = self.panel_block(
            format!(" AI Assistant - {} (F2 to switch) ", model.label()),
            focused,
            palette,
        );
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(inner);

        let key_label = format!("{} API key", model.key_vendor());
        f.render_widget(
            Paragraph::new(self.api_key.line(
                &key_label,
                focused && self.focus == ChatFocus::ApiKey,
                palette,
            )),
            chunks[0],
        );

        let lines = Self::transcript(chat.messages(), model.label(), chunks[1].width as usize, palette);
        Self::render_transcript(f, chunks[1], lines, chat.is_waiting(), palette);

        let names: Vec<&str> = self.attachments.iter().map(|a| a.name.as_str()).collect();
        let footer = vec![
            Line::from(Span::styled(
                format!("Attached: {}", if names.is_empty() { "-".to_string() } else { names.join(", ") }),
                Style::default().fg(palette.base_03),
            )),
            self.attachment.line(
                "Attach file",
                focused && self.focus == ChatFocus::Attachment,
                palette,
            ),
            self.message.line(
                "Message",
                focused && self.focus == ChatFocus::Message,
                palette,
            ),
        ];
        f.render_widget(Paragraph::new(footer), chunks[2]);
    }

    pub fn render_developer(
        &mut self,
        f: &mut Frame,
        area: Rect,
        chat: &DeveloperChat,
        focused: bool,
        palette: &Base16Palette,
    ) {
        let block = self.panel_block(
            format!(" Developer Chat - {} ", chat.language().as_str()),
            focused,
            palette,
        );
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(55),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        f.render_widget(
            Paragraph::new(self.api_key.line(
                "Gemini API key",
                focused && self.focus == ChatFocus::ApiKey,
                palette,
            )),
            chunks[0],
        );

        let lines = Self::transcript(chat.messages(), "Gemini", chunks[1].width as usize, palette);
        Self::render_transcript(f, chunks[1], lines, chat.is_waiting(), palette);

        let (mode, body) = match chat.preview_mode() {
            PreviewMode::Code => ("Code", chat.code_preview()),
            PreviewMode::Output => ("Output", chat.preview_output()),
        };
        let preview = Paragraph::new(body.to_string())
            .style(Style::default().fg(palette.base_0a))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(format!(" Preview: {mode} (F3 toggle, F5 run) "))
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(palette.base_03)),
            );
        f.render_widget(preview, chunks[2]);

        f.render_widget(
            Paragraph::new(self.message.line(
                "Message",
                focused && self.focus == ChatFocus::Message,
                palette,
            )),
            chunks[3],
        );

        if chat.awaiting_language() {
            self.render_language_picker(f, area, palette);
        }
    }

    fn render_language_picker(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup = fixed_rect(30, CodeLanguage::ALL.len() as u16 + 2, area);
        f.render_widget(Clear, popup);
        let items: Vec<ListItem> = CodeLanguage::ALL
            .iter()
            .map(|lang| {
                ListItem::new(Line::from(Span::styled(
                    lang.as_str(),
                    Style::default().fg(palette.base_06),
                )))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Which language? ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .highlight_style(
                Style::default()
                    .bg(palette.base_02)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("» ");
        f.render_stateful_widget(list, popup, &mut self.language_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn type_text(panel: &mut ChatPanel, text: &str) {
        for c in text.chars() {
            panel.handle_key(key(KeyCode::Char(c)), false);
        }
    }

    #[test]
    fn key_field_comes_first() {
        let mut panel = ChatPanel::new(ChatKind::Assistant);
        type_text(&mut panel, "sk-1");
        assert_eq!(
            panel.handle_key(key(KeyCode::Enter), false),
            Some(ChatPanelAction::SetApiKey("sk-1".to_string()))
        );
        panel.key_saved();
        type_text(&mut panel, "hello");
        assert_eq!(
            panel.handle_key(key(KeyCode::Enter), false),
            Some(ChatPanelAction::Send("hello".to_string()))
        );
    }

    #[test]
    fn attachment_field_collects_paths() {
        let mut panel = ChatPanel::new(ChatKind::Assistant);
        panel.key_saved();
        panel.handle_key(key(KeyCode::Tab), false);
        assert_eq!(panel.focus(), ChatFocus::Attachment);
        type_text(&mut panel, "a.pdf");
        assert_eq!(
            panel.handle_key(key(KeyCode::Enter), false),
            Some(ChatPanelAction::Attach("a.pdf".to_string()))
        );

        panel.add_attachment(ChatAttachment::new("a.pdf", 3));
        panel.handle_key(key(KeyCode::Backspace), false);
        assert!(panel.attachments().is_empty());
    }

    #[test]
    fn developer_focus_skips_attachments() {
        let mut panel = ChatPanel::new(ChatKind::Developer);
        panel.handle_key(key(KeyCode::Tab), false);
        assert_eq!(panel.focus(), ChatFocus::Message);
        panel.handle_key(key(KeyCode::Tab), false);
        assert_eq!(panel.focus(), ChatFocus::ApiKey);
        assert_eq!(
            panel.handle_key(key(KeyCode::F(5)), false),
            Some(ChatPanelAction::RunCode)
        );
    }

    #[test]
    fn language_picker_starts_on_default() {
        let mut panel = ChatPanel::new(ChatKind::Developer);
        assert_eq!(
            panel.handle_key(key(KeyCode::Enter), true),
            Some(ChatPanelAction::PickLanguage(CodeLanguage::TypeScript))
        );
        panel.handle_key(key(KeyCode::Down), true);
        assert_eq!(
            panel.handle_key(key(KeyCode::Enter), true),
            Some(ChatPanelAction::PickLanguage(CodeLanguage::Python))
        );
        assert_eq!(
            panel.handle_key(key(KeyCode::Esc), true),
            Some(ChatPanelAction::DismissLanguage)
        );
    }
}
