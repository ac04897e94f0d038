//! Modal dialogs of the editor screen

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::converter::{ConversionFormat, Converter};
use crate::editor::{DocumentProperties, PropertyField};
use crate::session::{ProfileUpdate, UserProfile};
use crate::theme::Base16Palette;
use crate::widget::fixed_rect;
use crate::widget::text_input::TextInput;

fn dialog_block(title: &str, palette: &Base16Palette) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.base_0c))
        .style(Style::default().bg(palette.base_00))
}

fn hint(text: &str, palette: &Base16Palette) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(palette.base_03),
    ))
}

fn button(label: &str, focused: bool, palette: &Base16Palette) -> Line<'static> {
    if focused {
        let (bg, fg) = palette.get_selection_colors(true);
        Line::from(Span::styled(
            format!("> {label} <"),
            Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            format!("  {label}  "),
            Style::default().fg(palette.base_0d),
        ))
    }
}

fn cycle(focus: usize, len: usize, forward: bool) -> usize {
    if forward {
        (focus + 1) % len
    } else {
        focus.checked_sub(1).unwrap_or(len - 1)
    }
}

// Single-line prompt

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Comment,
    OpenFile,
    TextEdit,
}

impl PromptKind {
    fn title(&self) -> &'static str {
        match self {
            PromptKind::Comment => "Add Comment",
            PromptKind::OpenFile => "Open File",
            PromptKind::TextEdit => "Edit Text",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PromptKind::Comment => "Comment",
            PromptKind::OpenFile => "Path",
            PromptKind::TextEdit => "Text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    Submit(String),
    Cancel,
}

pub struct PromptDialog {
    kind: PromptKind,
    input: TextInput,
}

impl PromptDialog {
    pub fn new(kind: PromptKind, initial: &str) -> Self {
        Self {
            kind,
            input: TextInput::with_value(initial),
        }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PromptAction> {
        match key.code {
            KeyCode::Enter => Some(PromptAction::Submit(self.input.value().to_string())),
            KeyCode::Esc => Some(PromptAction::Cancel),
            _ => {
                self.input.handle_key(key);
                None
            }
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        // The text editor docks under the page so the inline edit stays visible
        let popup = if self.kind == PromptKind::TextEdit {
            let height = 4.min(area.height);
            Rect {
                x: area.x,
                y: area.y + area.height - height,
                width: area.width,
                height,
            }
        } else {
            fixed_rect(64, 4, area)
        };
        f.render_widget(Clear, popup);
        let lines = vec![
            self.input.line(self.kind.label(), true, palette),
            hint("Enter to confirm, Esc to cancel", palette),
        ];
        f.render_widget(
            Paragraph::new(lines).block(dialog_block(self.kind.title(), palette)),
            popup,
        );
    }
}

// Document properties

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertiesAction {
    Save {
        values: Vec<(PropertyField, String)>,
        protected: bool,
    },
    Close,
}

pub struct PropertiesDialog {
    inputs: Vec<TextInput>,
    protected: bool,
    focus: usize,
}

impl PropertiesDialog {
    const PROTECT: usize = PropertyField::ALL.len();
    const SAVE: usize = PropertyField::ALL.len() + 1;

    pub fn new(props: &DocumentProperties) -> Self {
        Self {
            inputs: PropertyField::ALL
                .iter()
                .map(|field| TextInput::with_value(props.field(*field)))
                .collect(),
            protected: props.protected,
            focus: 0,
        }
    }

    fn save(&self) -> PropertiesAction {
        PropertiesAction::Save {
            values: PropertyField::ALL
                .iter()
                .zip(&self.inputs)
                .map(|(field, input)| (*field, input.value().to_string()))
                .collect(),
            protected: self.protected,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PropertiesAction> {
        if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(self.save());
        }
        match key.code {
            KeyCode::Esc => return Some(PropertiesAction::Close),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = cycle(self.focus, Self::SAVE + 1, true);
                return None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = cycle(self.focus, Self::SAVE + 1, false);
                return None;
            }
            KeyCode::Enter if self.focus == Self::SAVE => return Some(self.save()),
            KeyCode::Enter | KeyCode::Char(' ') if self.focus == Self::PROTECT => {
                self.protected = !self.protected;
                return None;
            }
            KeyCode::Enter => {
                self.focus = cycle(self.focus, Self::SAVE + 1, true);
                return None;
            }
            _ => {}
        }
        if let Some(input) = self.inputs.get_mut(self.focus) {
            input.handle_key(key);
        }
        None
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup = fixed_rect(60, 11, area);
        f.render_widget(Clear, popup);

        let mut lines: Vec<Line> = PropertyField::ALL
            .iter()
            .zip(&self.inputs)
            .enumerate()
            .map(|(i, (field, input))| input.line(field.label(), i == self.focus, palette))
            .collect();
        let checkbox = if self.protected { "[x]" } else { "[ ]" };
        let protect_style = if self.focus == Self::PROTECT {
            let (bg, fg) = palette.get_selection_colors(true);
            Style::default().fg(fg).bg(bg)
        } else {
            Style::default().fg(palette.base_05)
        };
        lines.push(Line::from(Span::styled(
            format!("{checkbox} Password protection"),
            protect_style,
        )));
        lines.push(button("Save", self.focus == Self::SAVE, palette));
        lines.push(hint("Tab to move, Ctrl+s to save, Esc to close", palette));

        f.render_widget(
            Paragraph::new(lines).block(dialog_block("Document Properties", palette)),
            popup,
        );
    }
}

// Conversion

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterAction {
    SelectFormat(ConversionFormat),
    AttachSample(String),
    Start,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConverterFocus {
    Formats,
    Sample,
    Convert,
}

pub struct ConverterDialog {
    sample: TextInput,
    focus: ConverterFocus,
}

impl Default for ConverterDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterDialog {
    pub fn new() -> Self {
        Self {
            sample: TextInput::new(),
            focus: ConverterFocus::Formats,
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        selected: ConversionFormat,
    ) -> Option<ConverterAction> {
        match (self.focus, key.code) {
            (_, KeyCode::Esc) => Some(ConverterAction::Close),
            (focus, KeyCode::Tab) => {
                self.focus = match focus {
                    ConverterFocus::Formats => ConverterFocus::Sample,
                    ConverterFocus::Sample => ConverterFocus::Convert,
                    ConverterFocus::Convert => ConverterFocus::Formats,
                };
                None
            }
            (ConverterFocus::Formats, KeyCode::Down | KeyCode::Char('j')) => {
                Some(ConverterAction::SelectFormat(selected.next()))
            }
            (ConverterFocus::Formats, KeyCode::Up | KeyCode::Char('k')) => {
                Some(ConverterAction::SelectFormat(selected.prev()))
            }
            (ConverterFocus::Sample, KeyCode::Enter) => {
                let name = self.sample.take();
                let name = name.trim();
                if name.is_empty() {
                    None
                } else {
                    Some(ConverterAction::AttachSample(name.to_string()))
                }
            }
            (ConverterFocus::Sample, _) => {
                self.sample.handle_key(key);
                None
            }
            (_, KeyCode::Enter) => Some(ConverterAction::Start),
            _ => None,
        }
    }

    pub fn render(
        &self,
        f: &mut Frame,
        area: Rect,
        converter: &Converter,
        document: Option<&str>,
        palette: &Base16Palette,
    ) {
        let popup = fixed_rect(56, 14, area);
        f.render_widget(Clear, popup);

        let source = document.unwrap_or("no file loaded");
        let mut lines = vec![Line::from(Span::styled(
            format!("Convert {source} to:"),
            Style::default().fg(palette.base_06),
        ))];
        for format in ConversionFormat::ALL {
            let selected = format == converter.selected();
            let marker = if selected { "(*)" } else { "( )" };
            let style = if selected && self.focus == ConverterFocus::Formats {
                let (bg, fg) = palette.get_selection_colors(true);
                Style::default().fg(fg).bg(bg)
            } else {
                Style::default().fg(palette.base_05)
            };
            lines.push(Line::from(Span::styled(
                format!("{marker} {}", format.label()),
                style,
            )));
        }
        lines.push(self.sample.line(
            "Sample file",
            self.focus == ConverterFocus::Sample,
            palette,
        ));
        if let Some(sample) = converter.sample() {
            lines.push(hint(&format!("Target format file: {sample}"), palette));
        }
        if converter.is_converting() {
            lines.push(Line::from(Span::styled(
                "Converting...",
                Style::default()
                    .fg(palette.base_0a)
                    .add_modifier(Modifier::BOLD),
            )));
        } else {
            lines.push(button(
                "Convert",
                self.focus == ConverterFocus::Convert,
                palette,
            ));
        }
        lines.push(hint("Up/Down to pick, Tab to move, Esc to close", palette));

        f.render_widget(
            Paragraph::new(lines).block(dialog_block("Convert Document", palette)),
            popup,
        );
    }
}

// Account menu

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAction {
    Save(ProfileUpdate),
    SignOut,
    Close,
}

pub struct AccountMenu {
    display_name: TextInput,
    photo_url: TextInput,
    text_color: TextInput,
    focus: usize,
}

impl AccountMenu {
    const SAVE: usize = 3;
    const SIGN_OUT: usize = 4;

    pub fn new(user: &UserProfile) -> Self {
        Self {
            display_name: TextInput::with_value(user.display_name.clone().unwrap_or_default()),
            photo_url: TextInput::with_value(user.photo_url.clone().unwrap_or_default()),
            text_color: TextInput::with_value(user.text_color.clone().unwrap_or_default()),
            focus: 0,
        }
    }

    fn update(&self) -> ProfileUpdate {
        ProfileUpdate {
            display_name: Some(self.display_name.value().trim().to_string()),
            photo_url: Some(self.photo_url.value().trim().to_string()),
            text_color: Some(self.text_color.value().trim().to_string()),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AccountAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return Some(AccountAction::SignOut);
        }
        match key.code {
            KeyCode::Esc => return Some(AccountAction::Close),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = cycle(self.focus, Self::SIGN_OUT + 1, true);
                return None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = cycle(self.focus, Self::SIGN_OUT + 1, false);
                return None;
            }
            KeyCode::Enter if self.focus == Self::SIGN_OUT => {
                return Some(AccountAction::SignOut);
            }
            KeyCode::Enter => return Some(AccountAction::Save(self.update())),
            _ => {}
        }
        let input = match self.focus {
            0 => &mut self.display_name,
            1 => &mut self.photo_url,
            2 => &mut self.text_color,
            _ => return None,
        };
        input.handle_key(key);
        None
    }

    pub fn render(&self, f: &mut Frame, area: Rect, user: &UserProfile, palette: &Base16Palette) {
        let popup = fixed_rect(60, 11, area);
        f.render_widget(Clear, popup);

        let signed_in_as = match &user.email {
            Some(email) => format!("{} ({email}) via {}", user.label(), user.provider.label()),
            None => format!("{} via {}", user.label(), user.provider.label()),
        };
        let lines = vec![
            Line::from(Span::styled(
                signed_in_as,
                Style::default().fg(palette.base_06),
            )),
            self.display_name
                .line("Display name", self.focus == 0, palette),
            self.photo_url.line("Photo URL", self.focus == 1, palette),
            self.text_color
                .line("Text colour", self.focus == 2, palette),
            button("Save profile", self.focus == Self::SAVE, palette),
            button("Sign out", self.focus == Self::SIGN_OUT, palette),
            hint("Enter to save, Ctrl+l to sign out, Esc to close", palette),
        ];
        f.render_widget(
            Paragraph::new(lines).block(dialog_block("Account", palette)),
            popup,
        );
    }
}
