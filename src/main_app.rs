use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use flume::Receiver;
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
};

use crate::chat::{ChatAttachment, PreviewMode};
use crate::editor::Editor;
use crate::event_source::EventSource;
use crate::identity::SignInMethod;
use crate::pages::{LANDING, LANDING_TAGLINE, NOT_FOUND, PRIVACY, TERMS};
use crate::routes::{self, Route};
use crate::session::{Session, SessionEvent, SubscriptionId};
use crate::theme::current_theme;
use crate::tool_mode::{CanvasAction, ToolMode};
use crate::viewer::Command;
use crate::widget::chat_panel::{ChatKind, ChatPanel, ChatPanelAction};
use crate::widget::dialogs::{
    AccountAction, AccountMenu, ConverterAction, ConverterDialog, PromptAction, PromptDialog,
    PromptKind, PropertiesAction, PropertiesDialog,
};
use crate::widget::help_popup::{HelpPopup, HelpPopupAction};
use crate::widget::login_form::{LoginAction, LoginField, LoginForm};
use crate::widget::notice_stack::render_notices;
use crate::widget::page_canvas::{self, Cell, PageCanvas};
use crate::widget::static_page::render_static_page;
use crate::widget::toolbar::{TOOLBAR_HEIGHT, render_toolbar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Which part of the editor screen receives keys when no popup is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Page,
    Assistant,
    Developer,
}

enum Popup {
    Help(HelpPopup),
    Prompt(PromptDialog),
    Properties(PropertiesDialog),
    Converter(ConverterDialog),
    Account(AccountMenu),
}

pub struct App {
    session: Session,
    subscription: SubscriptionId,
    session_events: Receiver<SessionEvent>,
    editor: Editor,
    route: Route,
    previous_route: Route,
    login: LoginForm,
    canvas: PageCanvas,
    popup: Option<Popup>,
    focus: PanelFocus,
    assistant_panel: ChatPanel,
    developer_panel: ChatPanel,
    page_scroll: u16,
    download_dir: PathBuf,
}

impl App {
    pub fn new(mut session: Session, editor: Editor, requested: Route, download_dir: PathBuf) -> Self {
        let (subscription, session_events) = session.subscribe();
        let agreed = session.consent().terms_accepted(Utc::now());
        let route = routes::resolve(requested, session.is_signed_in());
        info!("Starting at {}", route.path());

        Self {
            session,
            subscription,
            session_events,
            editor,
            route,
            previous_route: Route::Landing,
            login: LoginForm::new(agreed),
            canvas: PageCanvas::new(),
            popup: None,
            focus: PanelFocus::Page,
            assistant_panel: ChatPanel::new(ChatKind::Assistant),
            developer_panel: ChatPanel::new(ChatKind::Developer),
            page_scroll: 0,
            download_dir,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn canvas(&self) -> &PageCanvas {
        &self.canvas
    }

    pub fn focus(&self) -> PanelFocus {
        self.focus
    }

    pub fn has_popup(&self) -> bool {
        self.popup.is_some()
    }

    /// Go to `to`, subject to the sign-in guard
    pub fn navigate(&mut self, to: Route) {
        let resolved = routes::resolve(to, self.session.is_signed_in());
        if resolved == self.route {
            return;
        }
        info!("Navigating from {} to {}", self.route.path(), resolved.path());
        self.previous_route = std::mem::replace(&mut self.route, resolved);
        self.page_scroll = 0;
        if self.route != Route::Editor {
            self.popup = None;
        }
    }

    fn go_back(&mut self) {
        let back = match &self.previous_route {
            Route::Terms | Route::Privacy | Route::NotFound(_) => Route::Landing,
            other => other.clone(),
        };
        self.navigate(back);
    }

    fn drain_session_events(&mut self) {
        while let Ok(event) = self.session_events.try_recv() {
            match event {
                SessionEvent::SignedIn(user) => {
                    info!("Signed in as {}", user.uid);
                    if self.route == Route::Login {
                        self.navigate(Route::Editor);
                    }
                }
                SessionEvent::ProfileChanged(user) => {
                    debug!("Profile changed for {}", user.uid);
                }
                SessionEvent::SignedOut => {
                    self.popup = None;
                    self.editor.close_assistant();
                    self.editor.close_developer();
                    self.focus = PanelFocus::Page;
                    self.navigate(Route::Landing);
                }
            }
        }
    }

    /// Advance timers. Returns true when the screen should be redrawn.
    pub fn tick(&mut self, now: Instant) -> bool {
        let changed = self.editor.tick(now);
        self.sync_popups();
        self.drain_session_events();
        changed
    }

    /// Open or close the conversion dialog to match the editor
    fn sync_popups(&mut self) {
        let showing_converter = matches!(self.popup, Some(Popup::Converter(_)));
        if self.editor.converter_open() && !showing_converter && self.popup.is_none() {
            self.popup = Some(Popup::Converter(ConverterDialog::new()));
        } else if !self.editor.converter_open() && showing_converter {
            self.popup = None;
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppAction::Quit);
        }

        let action = if self.popup.is_some() {
            self.handle_popup_key(key);
            None
        } else {
            match self.route.clone() {
                Route::Landing => self.handle_landing_key(key),
                Route::Login => {
                    if let Some(action) = self.login.handle_key(key) {
                        self.perform_login_action(action);
                    }
                    None
                }
                Route::Editor => self.handle_editor_key(key),
                Route::Terms | Route::Privacy => self.handle_static_key(key),
                Route::NotFound(_) => match key.code {
                    KeyCode::Enter | KeyCode::Esc => {
                        self.navigate(Route::Landing);
                        None
                    }
                    KeyCode::Char('q') => Some(AppAction::Quit),
                    _ => None,
                },
            }
        };

        self.sync_popups();
        self.drain_session_events();
        action
    }

    fn handle_landing_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Enter | KeyCode::Char('e') => self.navigate(Route::Editor),
            KeyCode::Char('l') => self.navigate(Route::Login),
            KeyCode::Char('t') => self.navigate(Route::Terms),
            KeyCode::Char('p') => self.navigate(Route::Privacy),
            KeyCode::Char('?') => self.popup = Some(Popup::Help(HelpPopup::new())),
            KeyCode::Char('j') | KeyCode::Down => self.page_scroll = self.page_scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.page_scroll = self.page_scroll.saturating_sub(1),
            _ => {}
        }
        None
    }

    fn handle_static_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => self.page_scroll = self.page_scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.page_scroll = self.page_scroll.saturating_sub(1),
            KeyCode::Esc | KeyCode::Backspace => self.go_back(),
            _ => {}
        }
        None
    }

    fn perform_login_action(&mut self, action: LoginAction) {
        let agreed = self.login.agreed();
        let notices = self.editor.notices_mut();
        let result = match action {
            LoginAction::Google => self.session.sign_in(SignInMethod::Google, agreed, notices),
            LoginAction::Github => self.session.sign_in(SignInMethod::Github, agreed, notices),
            LoginAction::EmailSignIn { email, password } => {
                if email.is_empty() || password.is_empty() {
                    notices.error("Please enter your email and password");
                    return;
                }
                self.session
                    .sign_in(SignInMethod::Email { email, password }, agreed, notices)
            }
            LoginAction::CreateAccount { email, password } => {
                if email.is_empty() || password.is_empty() {
                    notices.error("Please enter your email and password");
                    return;
                }
                self.session
                    .sign_up_with_email(&email, &password, agreed, notices)
            }
            LoginAction::ResetPassword { email } => {
                if email.is_empty() {
                    notices.error("Please enter your email address");
                    return;
                }
                self.session.send_password_reset(&email, notices)
            }
            LoginAction::SendCode { phone } => {
                if phone.is_empty() {
                    notices.error("Please enter your phone number");
                    return;
                }
                let sent = self.session.sign_in_with_phone(&phone, agreed, notices);
                if sent.is_ok() {
                    self.login.mark_code_sent();
                    self.login.set_focus(LoginField::Code);
                }
                sent
            }
            LoginAction::VerifyCode { code } => self.session.verify_phone_code(&code, notices),
            LoginAction::OpenTerms => {
                self.navigate(Route::Terms);
                return;
            }
            LoginAction::OpenPrivacy => {
                self.navigate(Route::Privacy);
                return;
            }
            LoginAction::Back => {
                self.navigate(Route::Landing);
                return;
            }
        };
        if let Err(e) = result {
            debug!("Login action failed: {e}");
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match self.focus {
            PanelFocus::Assistant if self.editor.assistant().is_some() => {
                self.handle_assistant_key(key);
                return None;
            }
            PanelFocus::Developer if self.editor.developer().is_some() => {
                self.handle_developer_key(key);
                return None;
            }
            _ => {}
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => self.editor.save(),
            KeyCode::Char('d') if ctrl => {
                let dir = self.download_dir.clone();
                self.editor.download_to(&dir);
            }
            _ if ctrl => {}
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('?') => self.popup = Some(Popup::Help(HelpPopup::new())),
            KeyCode::Esc => {
                self.editor.notices_mut().dismiss_current();
            }
            KeyCode::Char(']') | KeyCode::PageDown => {
                let _ = self.editor.apply(Command::NextPage);
            }
            KeyCode::Char('[') | KeyCode::PageUp => {
                let _ = self.editor.apply(Command::PrevPage);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let _ = self.editor.apply(Command::ZoomIn);
            }
            KeyCode::Char('-') => {
                let _ = self.editor.apply(Command::ZoomOut);
            }
            KeyCode::Char('r') => {
                let _ = self.editor.apply(Command::Rotate);
            }
            KeyCode::Char('o') => {
                self.popup = Some(Popup::Prompt(PromptDialog::new(PromptKind::OpenFile, "")));
            }
            KeyCode::Char('p') => self.open_properties(),
            KeyCode::Char('a') => {
                self.editor.open_assistant();
                self.assistant_panel = ChatPanel::new(ChatKind::Assistant);
                self.focus = PanelFocus::Assistant;
            }
            KeyCode::Char('x') => {
                self.editor.open_developer();
                self.developer_panel = ChatPanel::new(ChatKind::Developer);
                self.focus = PanelFocus::Developer;
            }
            KeyCode::Char('u') => {
                if let Some(user) = self.session.current_user() {
                    self.popup = Some(Popup::Account(AccountMenu::new(user)));
                }
            }
            KeyCode::Char('e') => self.edit_text_at_cursor(),
            KeyCode::Delete => {
                if let Some(id) = self.canvas.annotation_at_cursor(&self.editor) {
                    self.editor.remove_annotation(id);
                }
            }
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Left => self.canvas.move_cursor(-1, 0),
            KeyCode::Right => self.canvas.move_cursor(1, 0),
            KeyCode::Up => self.canvas.move_cursor(0, -1),
            KeyCode::Down => self.canvas.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let cell = self.canvas.cursor();
                self.click_canvas(cell);
            }
            KeyCode::Char(c) => {
                if let Some(mode) = ToolMode::from_shortcut(c) {
                    self.editor.select_tool(mode);
                }
            }
            _ => {}
        }
        None
    }

    fn cycle_focus(&mut self) {
        let assistant = self.editor.assistant().is_some();
        let developer = self.editor.developer().is_some();
        self.focus = match self.focus {
            PanelFocus::Page if assistant => PanelFocus::Assistant,
            PanelFocus::Page | PanelFocus::Assistant if developer => PanelFocus::Developer,
            _ => PanelFocus::Page,
        };
    }

    fn open_properties(&mut self) {
        let Some(props) = self.editor.properties() else {
            self.editor.notices_mut().error("No document loaded");
            return;
        };
        let dialog = PropertiesDialog::new(props);
        if !self.editor.properties_open() {
            self.editor.toggle_properties();
        }
        self.popup = Some(Popup::Properties(dialog));
    }

    fn edit_text_at_cursor(&mut self) {
        let Some(id) = self.canvas.annotation_at_cursor(&self.editor) else {
            return;
        };
        if self.editor.edit_existing(id) {
            let text = self
                .editor
                .annotations()
                .active_edit()
                .map(|edit| edit.text.clone())
                .unwrap_or_default();
            self.popup = Some(Popup::Prompt(PromptDialog::new(PromptKind::TextEdit, &text)));
        }
    }

    fn click_canvas(&mut self, cell: Cell) {
        let at = page_canvas::point_at(cell, self.editor.view().scale());
        match self.editor.click(at) {
            CanvasAction::PromptComment { .. } => {
                self.popup = Some(Popup::Prompt(PromptDialog::new(PromptKind::Comment, "")));
            }
            CanvasAction::OpenTextEditor { .. } => {
                self.popup = Some(Popup::Prompt(PromptDialog::new(PromptKind::TextEdit, "")));
            }
            CanvasAction::AddHighlight { .. } | CanvasAction::None => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.popup.as_mut() else {
            return;
        };
        match popup {
            Popup::Help(help) => {
                if let Some(HelpPopupAction::Close) = help.handle_key(key) {
                    self.popup = None;
                }
            }
            Popup::Prompt(prompt) => {
                let kind = prompt.kind();
                let action = prompt.handle_key(key);
                if kind == PromptKind::TextEdit {
                    let text = prompt.value().to_string();
                    self.editor.set_edit_text(text);
                }
                if let Some(action) = action {
                    self.popup = None;
                    self.finish_prompt(kind, action);
                }
            }
            Popup::Properties(dialog) => match dialog.handle_key(key) {
                Some(PropertiesAction::Save { values, protected }) => {
                    for (field, value) in values {
                        self.editor.set_property(field, value);
                    }
                    if self.editor.properties().is_some_and(|p| p.protected != protected) {
                        self.editor.toggle_protection();
                    }
                    self.editor.save_properties();
                    self.close_properties();
                }
                Some(PropertiesAction::Close) => self.close_properties(),
                None => {}
            },
            Popup::Converter(dialog) => {
                let selected = self.editor.converter().selected();
                match dialog.handle_key(key, selected) {
                    Some(ConverterAction::SelectFormat(format)) => {
                        self.editor.converter_mut().select_format(format);
                    }
                    Some(ConverterAction::AttachSample(name)) => {
                        self.editor.attach_conversion_sample(&name);
                    }
                    Some(ConverterAction::Start) => {
                        if let Err(e) = self.editor.start_conversion(Instant::now()) {
                            debug!("Conversion not started: {e}");
                        }
                    }
                    Some(ConverterAction::Close) => {
                        self.editor.close_converter();
                        self.popup = None;
                    }
                    None => {}
                }
            }
            Popup::Account(menu) => match menu.handle_key(key) {
                Some(AccountAction::Save(update)) => {
                    let saved = self
                        .session
                        .update_profile(update, self.editor.notices_mut());
                    if saved.is_ok() {
                        self.popup = None;
                    }
                }
                Some(AccountAction::SignOut) => {
                    if let Err(e) = self.session.sign_out(self.editor.notices_mut()) {
                        warn!("Sign out failed: {e}");
                    }
                }
                Some(AccountAction::Close) => self.popup = None,
                None => {}
            },
        }
    }

    fn close_properties(&mut self) {
        if self.editor.properties_open() {
            self.editor.toggle_properties();
        }
        self.popup = None;
    }

    fn finish_prompt(&mut self, kind: PromptKind, action: PromptAction) {
        match (kind, action) {
            (PromptKind::Comment, PromptAction::Submit(text)) => {
                self.editor.answer_comment(Some(&text));
            }
            (PromptKind::Comment, PromptAction::Cancel) => {
                self.editor.answer_comment(None);
            }
            (PromptKind::TextEdit, PromptAction::Submit(text)) => {
                self.editor.set_edit_text(text);
                self.editor.commit_text_edit();
            }
            (PromptKind::TextEdit, PromptAction::Cancel) => self.editor.cancel_text_edit(),
            (PromptKind::OpenFile, PromptAction::Submit(path)) => {
                let path = path.trim().trim_matches(|c| c == '"' || c == '\'');
                if path.is_empty() {
                    return;
                }
                if self.editor.open_file(Path::new(path)).is_ok() {
                    self.canvas.set_cursor(Cell::default());
                }
            }
            (PromptKind::OpenFile, PromptAction::Cancel) => {}
        }
    }

    fn close_chat_focus(&mut self) {
        self.focus = if self.editor.developer().is_some() {
            PanelFocus::Developer
        } else if self.editor.assistant().is_some() {
            PanelFocus::Assistant
        } else {
            PanelFocus::Page
        };
    }

    fn handle_assistant_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::BackTab {
            self.cycle_focus();
            return;
        }
        let Some(action) = self.assistant_panel.handle_key(key, false) else {
            return;
        };
        match action {
            ChatPanelAction::Send(text) => {
                let attachments = self.assistant_panel.attachments().to_vec();
                match self.editor.send_to_assistant(&text, attachments) {
                    Ok(()) => self.assistant_panel.sent(),
                    Err(e) => debug!("Assistant message not sent: {e}"),
                }
            }
            ChatPanelAction::SetApiKey(api_key) => {
                if let Some(chat) = self.editor.assistant_mut() {
                    let has_key = !api_key.is_empty();
                    chat.set_api_key(api_key);
                    if has_key {
                        self.assistant_panel.key_saved();
                    }
                }
            }
            ChatPanelAction::Attach(path) => match std::fs::metadata(&path) {
                Ok(meta) => {
                    let name = Path::new(&path)
                        .file_name()
                        .map_or_else(|| path.clone(), |n| n.to_string_lossy().into_owned());
                    self.assistant_panel
                        .add_attachment(ChatAttachment::new(name, meta.len()));
                }
                Err(e) => {
                    warn!("Cannot attach {path}: {e}");
                    self.editor
                        .notices_mut()
                        .error(format!("Cannot attach {path}"));
                }
            },
            ChatPanelAction::SwitchModel => {
                if let Some(chat) = self.editor.assistant_mut() {
                    let model = chat.model().other();
                    chat.set_model(model);
                }
            }
            ChatPanelAction::Close => {
                self.editor.close_assistant();
                self.close_chat_focus();
            }
            _ => {}
        }
    }

    fn handle_developer_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::BackTab {
            self.cycle_focus();
            return;
        }
        let choosing = self
            .editor
            .developer()
            .is_some_and(|chat| chat.awaiting_language());
        let Some(action) = self.developer_panel.handle_key(key, choosing) else {
            return;
        };
        match action {
            ChatPanelAction::Send(text) => match self.editor.send_to_developer(&text) {
                Ok(outcome) => {
                    debug!("Developer request: {outcome:?}");
                    self.developer_panel.sent();
                }
                Err(e) => debug!("Developer message not sent: {e}"),
            },
            ChatPanelAction::SetApiKey(api_key) => {
                if let Some(chat) = self.editor.developer_mut() {
                    let has_key = !api_key.is_empty();
                    chat.set_api_key(api_key);
                    if has_key {
                        self.developer_panel.key_saved();
                    }
                }
            }
            ChatPanelAction::TogglePreview => {
                if let Some(chat) = self.editor.developer_mut() {
                    let mode = match chat.preview_mode() {
                        PreviewMode::Code => PreviewMode::Output,
                        PreviewMode::Output => PreviewMode::Code,
                    };
                    chat.set_preview_mode(mode);
                }
            }
            ChatPanelAction::RunCode => {
                self.editor.run_developer_code();
            }
            ChatPanelAction::PickLanguage(language) => {
                if let Err(e) = self.editor.confirm_developer_language(language) {
                    debug!("Language not confirmed: {e}");
                }
            }
            ChatPanelAction::DismissLanguage => {
                if let Some(chat) = self.editor.developer_mut() {
                    chat.dismiss_language_prompt();
                }
            }
            ChatPanelAction::Close => {
                self.editor.close_developer();
                self.close_chat_focus();
            }
            _ => {}
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.route != Route::Editor || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(cell) = self.canvas.hit(mouse.column, mouse.row) else {
            return;
        };

        match &self.popup {
            // A click beside the inline editor commits it
            Some(Popup::Prompt(prompt)) if prompt.kind() == PromptKind::TextEdit => {
                let text = prompt.value().to_string();
                self.popup = None;
                self.editor.set_edit_text(text);
                self.click_canvas(cell);
            }
            Some(_) => {}
            None => {
                self.focus = PanelFocus::Page;
                self.click_canvas(cell);
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        let area = f.area();
        f.render_widget(Block::default().style(Style::default().bg(palette.base_00)), area);

        match self.route.clone() {
            Route::Landing => render_static_page(
                f,
                area,
                &LANDING,
                Some(LANDING_TAGLINE),
                self.page_scroll,
                "Enter open the editor  l sign in  t terms  p privacy  ? help  q quit",
                palette,
            ),
            Route::Login => self.login.render(f, area, palette),
            Route::Editor => self.draw_editor(f, area),
            Route::Terms => render_static_page(
                f,
                area,
                &TERMS,
                None,
                self.page_scroll,
                "j/k scroll  Esc back",
                palette,
            ),
            Route::Privacy => render_static_page(
                f,
                area,
                &PRIVACY,
                None,
                self.page_scroll,
                "j/k scroll  Esc back",
                palette,
            ),
            Route::NotFound(path) => render_static_page(
                f,
                area,
                &NOT_FOUND,
                Some(&format!("Nothing lives at {path}")),
                0,
                "Enter go home  q quit",
                palette,
            ),
        }

        if let Some(Popup::Help(help)) = self.popup.as_mut() {
            help.render(f, area, palette);
        }
        render_notices(f, area, self.editor.notices(), palette);
    }

    fn draw_editor(&mut self, f: &mut Frame, area: Rect) {
        let palette = current_theme();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(TOOLBAR_HEIGHT), Constraint::Min(3)])
            .split(area);

        let user = self.session.current_user();
        render_toolbar(f, rows[0], &self.editor, user.map(|u| u.label()), palette);

        let assistant = self.editor.assistant();
        let developer = self.editor.developer();
        let (page_area, side_area) = if assistant.is_some() || developer.is_some() {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(rows[1]);
            (columns[0], Some(columns[1]))
        } else {
            (rows[1], None)
        };

        let text_color = user.and_then(|u| u.text_color.as_deref());
        self.canvas
            .render(f, page_area, &self.editor, text_color, palette);

        if let Some(side) = side_area {
            let panels: Vec<Rect> = if assistant.is_some() && developer.is_some() {
                Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(side)
                    .to_vec()
            } else {
                vec![side]
            };
            let mut slots = panels.into_iter();
            if let Some(chat) = assistant {
                if let Some(slot) = slots.next() {
                    self.assistant_panel.render_assistant(
                        f,
                        slot,
                        chat,
                        self.focus == PanelFocus::Assistant && self.popup.is_none(),
                        palette,
                    );
                }
            }
            if let (Some(chat), Some(slot)) = (developer, slots.next()) {
                self.developer_panel.render_developer(
                    f,
                    slot,
                    chat,
                    self.focus == PanelFocus::Developer && self.popup.is_none(),
                    palette,
                );
            }
        }

        match &self.popup {
            Some(Popup::Prompt(prompt)) => prompt.render(f, page_area, palette),
            Some(Popup::Properties(dialog)) => dialog.render(f, area, palette),
            Some(Popup::Converter(dialog)) => dialog.render(
                f,
                area,
                self.editor.converter(),
                self.editor.document().map(|doc| doc.name.as_str()),
                palette,
            ),
            Some(Popup::Account(menu)) => {
                if let Some(user) = self.session.current_user() {
                    menu.render(f, area, user, palette);
                }
            }
            Some(Popup::Help(_)) | None => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.session.unsubscribe(self.subscription) {
            debug!("Released session subscription");
        }
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Mouse(mouse_event) => app.handle_mouse_event(mouse_event),
                Event::Resize(cols, rows) => debug!("Resized to {cols}x{rows}"),
                _ => {}
            }

            if should_quit {
                break;
            }
        }

        let mut needs_redraw = events_processed > 0;

        if first_render {
            needs_redraw = true;
            first_render = false;
        }

        if last_tick.elapsed() >= tick_rate {
            if app.tick(Instant::now()) {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            info!("Quitting");
            return Ok(());
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}
