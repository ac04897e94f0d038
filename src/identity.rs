//! Identity provider seam
//!
//! The session never talks to an identity service directly; it goes through
//! [`IdentityProvider`]. The bundled [`LocalIdentityProvider`] accepts the
//! accounts listed in the config file.

use crate::settings::AccountConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Github,
    Email,
    Phone,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Github => "github",
            ProviderKind::Email => "email",
            ProviderKind::Phone => "phone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Google => "Google",
            ProviderKind::Github => "GitHub",
            ProviderKind::Email => "email and password",
            ProviderKind::Phone => "phone",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "google" => Some(ProviderKind::Google),
            "github" => Some(ProviderKind::Github),
            "email" => Some(ProviderKind::Email),
            "phone" => Some(ProviderKind::Phone),
            _ => None,
        }
    }
}

/// User record as the identity service reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub provider: ProviderKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInMethod {
    Google,
    Github,
    Email { email: String, password: String },
}

impl SignInMethod {
    pub fn provider(&self) -> ProviderKind {
        match self {
            SignInMethod::Google => ProviderKind::Google,
            SignInMethod::Github => ProviderKind::Github,
            SignInMethod::Email { .. } => ProviderKind::Email,
        }
    }
}

/// Fields owned by the identity service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardProfile {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl StandardProfile {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("no {0} account is configured")]
    NoAccount(&'static str),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for {0}")]
    AccountExists(String),
    #[error("no account is registered for {0}")]
    UnknownEmail(String),
    #[error("unknown user {0}")]
    UnknownUser(String),
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

pub trait IdentityProvider {
    fn sign_in(&mut self, method: &SignInMethod) -> Result<IdentityUser, IdentityError>;

    fn sign_up(&mut self, email: &str, password: &str) -> Result<IdentityUser, IdentityError>;

    fn send_password_reset(&mut self, email: &str) -> Result<(), IdentityError>;

    fn sign_out(&mut self) -> Result<(), IdentityError>;

    fn update_profile(
        &mut self,
        uid: &str,
        profile: &StandardProfile,
    ) -> Result<IdentityUser, IdentityError>;
}

/// Opaque, stable user id for a provider/email pair
pub fn user_id_for(provider: ProviderKind, email: &str) -> String {
    let digest = md5::compute(format!("{}:{}", provider.as_str(), email.to_lowercase()));
    format!("{digest:x}")
}

struct LocalAccount {
    user: IdentityUser,
    password: Option<String>,
}

/// Offline provider backed by a fixed account list.
pub struct LocalIdentityProvider {
    accounts: Vec<LocalAccount>,
}

impl LocalIdentityProvider {
    pub fn new(configs: &[AccountConfig]) -> Self {
        let accounts = configs
            .iter()
            .filter_map(|config| {
                let Some(provider) = ProviderKind::parse(&config.provider) else {
                    log::warn!(
                        "Ignoring account {} with unknown provider {}",
                        config.email,
                        config.provider
                    );
                    return None;
                };
                Some(LocalAccount {
                    user: IdentityUser {
                        uid: user_id_for(provider, &config.email),
                        display_name: config.display_name.clone(),
                        email: Some(config.email.clone()),
                        photo_url: config.photo_url.clone(),
                        provider,
                    },
                    password: config.password.clone(),
                })
            })
            .collect();
        Self { accounts }
    }

    pub fn from_settings() -> Self {
        Self::new(&crate::settings::accounts())
    }

    fn first_of(&self, provider: ProviderKind) -> Option<&LocalAccount> {
        self.accounts.iter().find(|a| a.user.provider == provider)
    }

    fn find_email(&self, email: &str) -> Option<&LocalAccount> {
        self.accounts.iter().find(|a| {
            a.user.provider == ProviderKind::Email
                && a.user
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
        })
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in(&mut self, method: &SignInMethod) -> Result<IdentityUser, IdentityError> {
        match method {
            SignInMethod::Google | SignInMethod::Github => {
                let provider = method.provider();
                self.first_of(provider)
                    .map(|a| a.user.clone())
                    .ok_or(IdentityError::NoAccount(provider.label()))
            }
            SignInMethod::Email { email, password } => match self.find_email(email) {
                Some(account) if account.password.as_deref() == Some(password.as_str()) => {
                    Ok(account.user.clone())
                }
                _ => Err(IdentityError::InvalidCredentials),
            },
        }
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        if self.find_email(email).is_some() {
            return Err(IdentityError::AccountExists(email.to_string()));
        }
        let user = IdentityUser {
            uid: user_id_for(ProviderKind::Email, email),
            display_name: None,
            email: Some(email.to_string()),
            photo_url: None,
            provider: ProviderKind::Email,
        };
        self.accounts.push(LocalAccount {
            user: user.clone(),
            password: Some(password.to_string()),
        });
        Ok(user)
    }

    fn send_password_reset(&mut self, email: &str) -> Result<(), IdentityError> {
        if self.find_email(email).is_some() {
            log::info!("Password reset requested for {email}");
            Ok(())
        } else {
            Err(IdentityError::UnknownEmail(email.to_string()))
        }
    }

    fn sign_out(&mut self) -> Result<(), IdentityError> {
        Ok(())
    }

    fn update_profile(
        &mut self,
        uid: &str,
        profile: &StandardProfile,
    ) -> Result<IdentityUser, IdentityError> {
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.user.uid == uid)
            .ok_or_else(|| IdentityError::UnknownUser(uid.to_string()))?;
        if let Some(name) = &profile.display_name {
            account.user.display_name = Some(name.clone());
        }
        if let Some(photo) = &profile.photo_url {
            account.user.photo_url = Some(photo.clone());
        }
        Ok(account.user.clone())
    }
}

/// Provider with a scripted outcome that counts every call made to it.
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    pub struct CallCounter(Arc<AtomicUsize>);

    impl CallCounter {
        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }

        fn bump(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub struct ScriptedProvider {
        pub user: IdentityUser,
        pub fail_with: Option<IdentityError>,
        calls: CallCounter,
    }

    impl ScriptedProvider {
        pub fn new(user: IdentityUser) -> Self {
            Self {
                user,
                fail_with: None,
                calls: CallCounter::default(),
            }
        }

        pub fn failing(user: IdentityUser, error: IdentityError) -> Self {
            Self {
                user,
                fail_with: Some(error),
                calls: CallCounter::default(),
            }
        }

        pub fn calls(&self) -> CallCounter {
            self.calls.clone()
        }

        fn outcome(&self) -> Result<(), IdentityError> {
            self.calls.bump();
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    pub fn sample_user() -> IdentityUser {
        IdentityUser {
            uid: "uid-sample".to_string(),
            display_name: Some("Sample Reader".to_string()),
            email: Some("reader@example.com".to_string()),
            photo_url: None,
            provider: ProviderKind::Google,
        }
    }

    impl IdentityProvider for ScriptedProvider {
        fn sign_in(&mut self, method: &SignInMethod) -> Result<IdentityUser, IdentityError> {
            self.outcome()?;
            let mut user = self.user.clone();
            user.provider = method.provider();
            Ok(user)
        }

        fn sign_up(&mut self, email: &str, _password: &str) -> Result<IdentityUser, IdentityError> {
            self.outcome()?;
            let mut user = self.user.clone();
            user.email = Some(email.to_string());
            user.provider = ProviderKind::Email;
            Ok(user)
        }

        fn send_password_reset(&mut self, _email: &str) -> Result<(), IdentityError> {
            self.outcome()
        }

        fn sign_out(&mut self) -> Result<(), IdentityError> {
            self.outcome()
        }

        fn update_profile(
            &mut self,
            _uid: &str,
            profile: &StandardProfile,
        ) -> Result<IdentityUser, IdentityError> {
            self.outcome()?;
            if let Some(name) = &profile.display_name {
                self.user.display_name = Some(name.clone());
            }
            if let Some(photo) = &profile.photo_url {
                self.user.photo_url = Some(photo.clone());
            }
            Ok(self.user.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<AccountConfig> {
        vec![
            AccountConfig {
                provider: "google".into(),
                email: "g@example.com".into(),
                display_name: Some("Gee".into()),
                photo_url: None,
                password: None,
            },
            AccountConfig {
                provider: "email".into(),
                email: "e@example.com".into(),
                display_name: None,
                photo_url: None,
                password: Some("secret".into()),
            },
            AccountConfig {
                provider: "fax".into(),
                email: "f@example.com".into(),
                display_name: None,
                photo_url: None,
                password: None,
            },
        ]
    }

    #[test]
    fn google_sign_in_uses_configured_account() {
        let mut provider = LocalIdentityProvider::new(&accounts());
        let user = provider.sign_in(&SignInMethod::Google).unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Gee"));
        assert_eq!(user.uid, user_id_for(ProviderKind::Google, "g@example.com"));
    }

    #[test]
    fn github_without_account_fails() {
        let mut provider = LocalIdentityProvider::new(&accounts());
        assert_eq!(
            provider.sign_in(&SignInMethod::Github),
            Err(IdentityError::NoAccount("GitHub"))
        );
    }

    #[test]
    fn email_sign_in_checks_password() {
        let mut provider = LocalIdentityProvider::new(&accounts());
        let wrong = SignInMethod::Email {
            email: "e@example.com".into(),
            password: "nope".into(),
        };
        assert_eq!(provider.sign_in(&wrong), Err(IdentityError::InvalidCredentials));

        let right = SignInMethod::Email {
            email: "E@example.com".into(),
            password: "secret".into(),
        };
        assert!(provider.sign_in(&right).is_ok());
    }

    #[test]
    fn sign_up_rejects_duplicates() {
        let mut provider = LocalIdentityProvider::new(&accounts());
        assert!(matches!(
            provider.sign_up("e@example.com", "x"),
            Err(IdentityError::AccountExists(_))
        ));
        let user = provider.sign_up("new@example.com", "pw").unwrap();
        assert_eq!(user.provider, ProviderKind::Email);
        assert!(provider.send_password_reset("new@example.com").is_ok());
    }

    #[test]
    fn update_profile_changes_standard_fields() {
        let mut provider = LocalIdentityProvider::new(&accounts());
        let user = provider.sign_in(&SignInMethod::Google).unwrap();
        let updated = provider
            .update_profile(
                &user.uid,
                &StandardProfile {
                    display_name: Some("New".into()),
                    photo_url: None,
                },
            )
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("New"));
    }
}
