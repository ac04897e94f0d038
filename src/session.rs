//! Session provider
//!
//! Holds the signed-in user, mediates every auth operation through an
//! [`IdentityProvider`] and merges locally stored preferences onto the user.
//! Interested parties observe changes through [`Session::subscribe`].

use flume::{Receiver, Sender};
use log::{error, info};

use crate::consent::ConsentJar;
use crate::identity::{
    IdentityError, IdentityProvider, IdentityUser, ProviderKind, SignInMethod, StandardProfile,
    user_id_for,
};
use crate::notification::Notices;
use crate::profile_store::{PrefsUpdate, ProfilePrefs, ProfileStore, ProfileStoreError};

const DEMO_VERIFICATION_ID: &str = "demo-verification-id";
const DEMO_VERIFICATION_CODE: &str = "123456";

/// The signed-in user: identity fields plus the local extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub provider: ProviderKind,
    pub text_color: Option<String>,
}

impl UserProfile {
    fn from_identity(user: IdentityUser, prefs: &ProfilePrefs) -> Self {
        Self {
            uid: user.uid,
            display_name: user.display_name,
            email: user.email,
            photo_url: user.photo_url,
            provider: user.provider,
            text_color: prefs.text_color.clone(),
        }
    }

    /// Name shown in the account menu
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Signed in")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub text_color: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no user is signed in")]
    NotSignedIn,
    #[error("terms of service were not accepted")]
    TermsNotAccepted,
    #[error("no phone verification is pending")]
    NoPendingVerification,
    #[error("invalid verification code")]
    InvalidCode,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Store(#[from] ProfileStoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(UserProfile),
    ProfileChanged(UserProfile),
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Session {
    provider: Box<dyn IdentityProvider>,
    store: ProfileStore,
    consent: ConsentJar,
    current: Option<UserProfile>,
    subscribers: Vec<(SubscriptionId, Sender<SessionEvent>)>,
    next_subscription: u64,
    pending_phone: Option<(String, String)>,
}

impl Session {
    pub fn new(
        provider: Box<dyn IdentityProvider>,
        store: ProfileStore,
        consent: ConsentJar,
    ) -> Self {
        Self {
            provider,
            store,
            consent,
            current: None,
            subscribers: Vec::new(),
            next_subscription: 0,
            pending_phone: None,
        }
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn consent(&self) -> &ConsentJar {
        &self.consent
    }

    pub fn consent_mut(&mut self) -> &mut ConsentJar {
        &mut self.consent
    }

    /// Register an observer. The current state is delivered immediately.
    pub fn subscribe(&mut self) -> (SubscriptionId, Receiver<SessionEvent>) {
        let (tx, rx) = flume::unbounded();
        let initial = match &self.current {
            Some(user) => SessionEvent::SignedIn(user.clone()),
            None => SessionEvent::SignedOut,
        };
        let _ = tx.send(initial);
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn publish(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// Sign in through the identity provider. Refused without touching the
    /// provider when the user has not ticked the terms agreement.
    pub fn sign_in(
        &mut self,
        method: SignInMethod,
        agreed_to_terms: bool,
        notices: &mut Notices,
    ) -> Result<(), SessionError> {
        if !agreed_to_terms {
            notices.error("Please accept the Terms of Service and Privacy Policy to continue");
            return Err(SessionError::TermsNotAccepted);
        }

        let provider = method.provider();
        match self.provider.sign_in(&method) {
            Ok(user) => {
                self.establish(user);
                notices.success(format!("Successfully signed in with {}", provider.label()));
                Ok(())
            }
            Err(e) => {
                error!("Error signing in with {}: {e}", provider.label());
                notices.error(format!("Failed to sign in with {}", provider.label()));
                Err(e.into())
            }
        }
    }

    pub fn sign_up_with_email(
        &mut self,
        email: &str,
        password: &str,
        agreed_to_terms: bool,
        notices: &mut Notices,
    ) -> Result<(), SessionError> {
        if !agreed_to_terms {
            notices.error("Please accept the Terms of Service and Privacy Policy to continue");
            return Err(SessionError::TermsNotAccepted);
        }

        match self.provider.sign_up(email, password) {
            Ok(user) => {
                self.establish(user);
                notices.success("Successfully created a new account");
                Ok(())
            }
            Err(e) => {
                error!("Error creating account for {email}: {e}");
                notices.error("Failed to create a new account");
                Err(e.into())
            }
        }
    }

    pub fn send_password_reset(
        &mut self,
        email: &str,
        notices: &mut Notices,
    ) -> Result<(), SessionError> {
        match self.provider.send_password_reset(email) {
            Ok(()) => {
                notices.success("Password reset email has been sent");
                Ok(())
            }
            Err(e) => {
                error!("Error sending password reset email: {e}");
                notices.error("Failed to send password reset email");
                Err(e.into())
            }
        }
    }

    /// First half of phone sign-in: pretend a code was texted.
    pub fn sign_in_with_phone(
        &mut self,
        phone_number: &str,
        agreed_to_terms: bool,
        notices: &mut Notices,
    ) -> Result<(), SessionError> {
        if !agreed_to_terms {
            notices.error("Please accept the Terms of Service and Privacy Policy to continue");
            return Err(SessionError::TermsNotAccepted);
        }
        info!("Sending verification code to {phone_number}");
        self.pending_phone = Some((
            DEMO_VERIFICATION_ID.to_string(),
            phone_number.to_string(),
        ));
        notices.success(format!(
            "A verification code has been sent to {phone_number}"
        ));
        Ok(())
    }

    pub fn verify_phone_code(
        &mut self,
        code: &str,
        notices: &mut Notices,
    ) -> Result<(), SessionError> {
        let Some((verification_id, phone_number)) = self.pending_phone.clone() else {
            notices.error("Failed to verify code");
            return Err(SessionError::NoPendingVerification);
        };
        info!("Verifying code with id {verification_id}");

        if code.trim() != DEMO_VERIFICATION_CODE {
            error!("Invalid verification code for {phone_number}");
            notices.error("Failed to verify code");
            return Err(SessionError::InvalidCode);
        }

        self.pending_phone = None;
        self.establish(IdentityUser {
            uid: user_id_for(ProviderKind::Phone, &phone_number),
            display_name: Some(phone_number),
            email: None,
            photo_url: None,
            provider: ProviderKind::Phone,
        });
        notices.success("Phone number verified successfully");
        Ok(())
    }

    pub fn sign_out(&mut self, notices: &mut Notices) -> Result<(), SessionError> {
        match self.provider.sign_out() {
            Ok(()) => {
                self.current = None;
                self.publish(SessionEvent::SignedOut);
                notices.success("Successfully signed out");
                Ok(())
            }
            Err(e) => {
                error!("Error signing out: {e}");
                notices.error("Failed to sign out");
                Err(e.into())
            }
        }
    }

    /// Standard fields go to the identity provider, the text colour to the
    /// local profile store; the in-memory user reflects both.
    pub fn update_profile(
        &mut self,
        update: ProfileUpdate,
        notices: &mut Notices,
    ) -> Result<(), SessionError> {
        let Some(mut user) = self.current.clone() else {
            notices.error("No user is signed in");
            return Err(SessionError::NotSignedIn);
        };

        let standard = StandardProfile {
            display_name: update.display_name.filter(|s| !s.is_empty()),
            photo_url: update.photo_url.filter(|s| !s.is_empty()),
        };
        if !standard.is_empty() {
            match self.provider.update_profile(&user.uid, &standard) {
                Ok(identity) => {
                    user.display_name = identity.display_name;
                    user.photo_url = identity.photo_url;
                }
                Err(e) => {
                    error!("Error updating profile: {e}");
                    notices.error("Failed to update profile");
                    return Err(e.into());
                }
            }
        }

        let custom = PrefsUpdate {
            text_color: update.text_color.filter(|s| !s.is_empty()),
        };
        if !custom.is_empty() {
            match self.store.merge(&user.uid, &custom) {
                Ok(prefs) => user.text_color = prefs.text_color,
                Err(e) => {
                    error!("Error saving profile preferences: {e}");
                    notices.error("Failed to update profile");
                    return Err(e.into());
                }
            }
        }

        self.current = Some(user.clone());
        self.publish(SessionEvent::ProfileChanged(user));
        notices.success("Profile updated");
        Ok(())
    }

    fn establish(&mut self, user: IdentityUser) {
        let prefs = self.store.get(&user.uid);
        let profile = UserProfile::from_identity(user, &prefs);
        info!("Signed in as {}", profile.uid);
        if let Err(e) = self.consent.accept_terms() {
            error!("Failed to record terms acceptance: {e:#}");
        }
        self.current = Some(profile.clone());
        self.publish(SessionEvent::SignedIn(profile));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::scripted::{ScriptedProvider, sample_user};
    use chrono::Utc;

    fn session_with(provider: ScriptedProvider) -> Session {
        Session::new(
            Box::new(provider),
            ProfileStore::ephemeral(),
            ConsentJar::ephemeral(),
        )
    }

    #[test]
    fn unchecked_agreement_never_reaches_provider() {
        let provider = ScriptedProvider::new(sample_user());
        let calls = provider.calls();
        let mut session = session_with(provider);
        let mut notices = Notices::new();

        let result = session.sign_in(SignInMethod::Google, false, &mut notices);

        assert!(matches!(result, Err(SessionError::TermsNotAccepted)));
        assert_eq!(calls.get(), 0);
        assert_eq!(notices.count(), 1);
        assert!(!session.is_signed_in());
    }

    #[test]
    fn sign_in_sets_user_and_terms_cookie() {
        let mut session = session_with(ScriptedProvider::new(sample_user()));
        let mut notices = Notices::new();

        session
            .sign_in(SignInMethod::Github, true, &mut notices)
            .unwrap();

        let user = session.current_user().unwrap();
        assert_eq!(user.provider, ProviderKind::Github);
        assert!(session.consent().terms_accepted(Utc::now()));
        assert!(notices.contains("Successfully signed in with GitHub"));
    }

    #[test]
    fn failed_sign_in_notifies_and_stays_signed_out() {
        let provider = ScriptedProvider::failing(
            sample_user(),
            IdentityError::Unavailable("offline".into()),
        );
        let mut session = session_with(provider);
        let mut notices = Notices::new();

        assert!(session.sign_in(SignInMethod::Google, true, &mut notices).is_err());
        assert!(!session.is_signed_in());
        assert!(notices.contains("Failed to sign in with Google"));
        assert!(!session.consent().terms_accepted(Utc::now()));
    }

    #[test]
    fn update_profile_requires_user() {
        let mut session = session_with(ScriptedProvider::new(sample_user()));
        let mut notices = Notices::new();
        let result = session.update_profile(
            ProfileUpdate {
                text_color: Some("red".into()),
                ..Default::default()
            },
            &mut notices,
        );
        assert!(matches!(result, Err(SessionError::NotSignedIn)));
    }

    #[test]
    fn stored_color_is_merged_at_sign_in() {
        let mut store = ProfileStore::ephemeral();
        store
            .merge(
                &sample_user().uid,
                &PrefsUpdate {
                    text_color: Some("#123456".into()),
                },
            )
            .unwrap();
        let mut session = Session::new(
            Box::new(ScriptedProvider::new(sample_user())),
            store,
            ConsentJar::ephemeral(),
        );
        let mut notices = Notices::new();
        session.sign_in(SignInMethod::Google, true, &mut notices).unwrap();

        assert_eq!(
            session.current_user().unwrap().text_color.as_deref(),
            Some("#123456")
        );
    }

    #[test]
    fn update_profile_merges_both_sides() {
        let mut session = session_with(ScriptedProvider::new(sample_user()));
        let mut notices = Notices::new();
        session.sign_in(SignInMethod::Google, true, &mut notices).unwrap();

        session
            .update_profile(
                ProfileUpdate {
                    display_name: Some("Renamed".into()),
                    photo_url: None,
                    text_color: Some("teal".into()),
                },
                &mut notices,
            )
            .unwrap();

        let user = session.current_user().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Renamed"));
        assert_eq!(user.text_color.as_deref(), Some("teal"));
    }

    #[test]
    fn subscribers_see_lifecycle() {
        let mut session = session_with(ScriptedProvider::new(sample_user()));
        let mut notices = Notices::new();
        let (id, rx) = session.subscribe();
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SignedOut);

        session.sign_in(SignInMethod::Google, true, &mut notices).unwrap();
        assert!(matches!(rx.try_recv().unwrap(), SessionEvent::SignedIn(_)));

        session.sign_out(&mut notices).unwrap();
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SignedOut);

        assert!(session.unsubscribe(id));
        session.sign_in(SignInMethod::Google, true, &mut notices).unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(session.subscriber_count(), 0);
    }

    #[test]
    fn phone_code_must_match() {
        let mut session = session_with(ScriptedProvider::new(sample_user()));
        let mut notices = Notices::new();

        assert!(matches!(
            session.verify_phone_code("123456", &mut notices),
            Err(SessionError::NoPendingVerification)
        ));

        session
            .sign_in_with_phone("+15550100", true, &mut notices)
            .unwrap();
        assert!(matches!(
            session.verify_phone_code("000000", &mut notices),
            Err(SessionError::InvalidCode)
        ));
        session.verify_phone_code("123456", &mut notices).unwrap();
        assert_eq!(
            session.current_user().unwrap().provider,
            ProviderKind::Phone
        );
    }
}
