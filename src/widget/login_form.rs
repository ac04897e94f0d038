//! `/login`: provider buttons, email and phone forms, terms agreement

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::pages::PRODUCT_NAME;
use crate::theme::Base16Palette;
use crate::widget::fixed_rect;
use crate::widget::text_input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Google,
    Github,
    Email,
    Password,
    SignIn,
    CreateAccount,
    ResetPassword,
    Phone,
    SendCode,
    Code,
    VerifyCode,
    Agree,
    Terms,
    Privacy,
}

impl LoginField {
    pub const ORDER: [LoginField; 14] = [
        LoginField::Google,
        LoginField::Github,
        LoginField::Email,
        LoginField::Password,
        LoginField::SignIn,
        LoginField::CreateAccount,
        LoginField::ResetPassword,
        LoginField::Phone,
        LoginField::SendCode,
        LoginField::Code,
        LoginField::VerifyCode,
        LoginField::Agree,
        LoginField::Terms,
        LoginField::Privacy,
    ];

    fn button_label(&self) -> Option<&'static str> {
        match self {
            LoginField::Google => Some("Sign in with Google"),
            LoginField::Github => Some("Sign in with GitHub"),
            LoginField::SignIn => Some("Sign in with email"),
            LoginField::CreateAccount => Some("Create account"),
            LoginField::ResetPassword => Some("Forgot password?"),
            LoginField::SendCode => Some("Send code"),
            LoginField::VerifyCode => Some("Verify code"),
            LoginField::Terms => Some("Terms of Service"),
            LoginField::Privacy => Some("Privacy Policy"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    Google,
    Github,
    EmailSignIn { email: String, password: String },
    CreateAccount { email: String, password: String },
    ResetPassword { email: String },
    SendCode { phone: String },
    VerifyCode { code: String },
    OpenTerms,
    OpenPrivacy,
    Back,
}

pub struct LoginForm {
    email: TextInput,
    password: TextInput,
    phone: TextInput,
    code: TextInput,
    agreed: bool,
    focus: usize,
    code_sent: bool,
}

impl LoginForm {
    pub fn new(agreed: bool) -> Self {
        Self {
            email: TextInput::new(),
            password: TextInput::masked(),
            phone: TextInput::new(),
            code: TextInput::new(),
            agreed,
            focus: 0,
            code_sent: false,
        }
    }

    pub fn focus(&self) -> LoginField {
        LoginField::ORDER[self.focus]
    }

    pub fn set_focus(&mut self, field: LoginField) {
        if let Some(i) = LoginField::ORDER.iter().position(|f| *f == field) {
            self.focus = i;
        }
    }

    pub fn agreed(&self) -> bool {
        self.agreed
    }

    pub fn set_agreed(&mut self, agreed: bool) {
        self.agreed = agreed;
    }

    /// The phone step has started, reveal the code field hint
    pub fn mark_code_sent(&mut self) {
        self.code_sent = true;
    }

    fn next(&mut self) {
        self.focus = (self.focus + 1) % LoginField::ORDER.len();
    }

    fn previous(&mut self) {
        self.focus = self
            .focus
            .checked_sub(1)
            .unwrap_or(LoginField::ORDER.len() - 1);
    }

    fn input_mut(&mut self, field: LoginField) -> Option<&mut TextInput> {
        match field {
            LoginField::Email => Some(&mut self.email),
            LoginField::Password => Some(&mut self.password),
            LoginField::Phone => Some(&mut self.phone),
            LoginField::Code => Some(&mut self.code),
            _ => None,
        }
    }

    fn credentials(&self) -> (String, String) {
        (
            self.email.value().trim().to_string(),
            self.password.value().to_string(),
        )
    }

    fn activate(&mut self, field: LoginField) -> Option<LoginAction> {
        match field {
            LoginField::Google => Some(LoginAction::Google),
            LoginField::Github => Some(LoginAction::Github),
            LoginField::Password | LoginField::SignIn => {
                let (email, password) = self.credentials();
                Some(LoginAction::EmailSignIn { email, password })
            }
            LoginField::CreateAccount => {
                let (email, password) = self.credentials();
                Some(LoginAction::CreateAccount { email, password })
            }
            LoginField::ResetPassword => Some(LoginAction::ResetPassword {
                email: self.email.value().trim().to_string(),
            }),
            LoginField::Phone | LoginField::SendCode => Some(LoginAction::SendCode {
                phone: self.phone.value().trim().to_string(),
            }),
            LoginField::Code | LoginField::VerifyCode => Some(LoginAction::VerifyCode {
                code: self.code.value().trim().to_string(),
            }),
            LoginField::Agree => {
                self.agreed = !self.agreed;
                None
            }
            LoginField::Terms => Some(LoginAction::OpenTerms),
            LoginField::Privacy => Some(LoginAction::OpenPrivacy),
            LoginField::Email => {
                self.next();
                None
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<LoginAction> {
        let field = self.focus();
        match key.code {
            KeyCode::Esc => return Some(LoginAction::Back),
            KeyCode::Tab | KeyCode::Down => {
                self.next();
                return None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.previous();
                return None;
            }
            KeyCode::Enter => return self.activate(field),
            KeyCode::Char(' ') if field == LoginField::Agree => {
                self.agreed = !self.agreed;
                return None;
            }
            _ => {}
        }
        if let Some(input) = self.input_mut(field) {
            input.handle_key(key);
        }
        None
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup = fixed_rect(60, 24, area);
        f.render_widget(Clear, popup);

        let focus = self.focus();
        let (selected_bg, selected_fg) = palette.get_selection_colors(true);
        let button = |field: LoginField| -> Line<'static> {
            let label = field.button_label().unwrap_or_default();
            if field == focus {
                Line::from(Span::styled(
                    format!("> {label} <"),
                    Style::default()
                        .fg(selected_fg)
                        .bg(selected_bg)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(
                    format!("  {label}  "),
                    Style::default().fg(palette.base_0d),
                ))
            }
        };
        let heading = |text: &str| -> Line<'static> {
            Line::from(Span::styled(
                text.to_string(),
                Style::default()
                    .fg(palette.base_04)
                    .add_modifier(Modifier::BOLD),
            ))
        };

        let checkbox = if self.agreed { "[x]" } else { "[ ]" };
        let agree_style = if focus == LoginField::Agree {
            Style::default().fg(selected_fg).bg(selected_bg)
        } else {
            Style::default().fg(palette.base_05)
        };

        let mut lines = vec![
            button(LoginField::Google),
            button(LoginField::Github),
            Line::from(""),
            heading("Email"),
            self.email.line("Email", focus == LoginField::Email, palette),
            self.password
                .line("Password", focus == LoginField::Password, palette),
            button(LoginField::SignIn),
            button(LoginField::CreateAccount),
            button(LoginField::ResetPassword),
            Line::from(""),
            heading("Phone"),
            self.phone.line("Phone", focus == LoginField::Phone, palette),
            button(LoginField::SendCode),
            self.code
                .line("Code", focus == LoginField::Code, palette),
            button(LoginField::VerifyCode),
            Line::from(""),
            Line::from(Span::styled(
                format!("{checkbox} I agree to the Terms of Service and Privacy Policy"),
                agree_style,
            )),
        ];
        let mut links = button(LoginField::Terms).spans;
        links.extend(button(LoginField::Privacy).spans);
        lines.push(Line::from(links));
        if self.code_sent {
            lines.push(Line::from(Span::styled(
                "Enter the 6-digit code we sent you",
                Style::default().fg(palette.base_03),
            )));
        }

        let form = Paragraph::new(lines).block(
            Block::default()
                .title(format!(" Sign in to {PRODUCT_NAME} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0c))
                .style(Style::default().bg(palette.base_00)),
        );
        f.render_widget(form, popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn type_text(form: &mut LoginForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn email_sign_in_carries_typed_credentials() {
        let mut form = LoginForm::new(false);
        form.set_focus(LoginField::Email);
        type_text(&mut form, "me@example.com");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "pw");
        assert_eq!(
            form.handle_key(key(KeyCode::Enter)),
            Some(LoginAction::EmailSignIn {
                email: "me@example.com".to_string(),
                password: "pw".to_string(),
            })
        );
    }

    #[test]
    fn agreement_toggles_with_space() {
        let mut form = LoginForm::new(false);
        form.set_focus(LoginField::Agree);
        form.handle_key(key(KeyCode::Char(' ')));
        assert!(form.agreed());
        form.handle_key(key(KeyCode::Enter));
        assert!(!form.agreed());
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = LoginForm::new(false);
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.focus(), LoginField::Privacy);
        form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.focus(), LoginField::Google);
    }

    #[test]
    fn typed_letters_stay_in_fields() {
        let mut form = LoginForm::new(false);
        form.set_focus(LoginField::Phone);
        type_text(&mut form, "q+1555");
        assert_eq!(
            form.handle_key(key(KeyCode::Enter)),
            Some(LoginAction::SendCode {
                phone: "q+1555".to_string()
            })
        );
    }
}
