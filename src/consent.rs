//! Consent cookies
//!
//! Only two cookies exist: `cookie_consent`, set to `essential` on first
//! start, and `terms_accepted`, set after a successful sign-in.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONSENT_COOKIE: &str = "cookie_consent";
pub const TERMS_COOKIE: &str = "terms_accepted";
const COOKIES_FILENAME: &str = "cookies.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConsentJar {
    cookies: BTreeMap<String, Cookie>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl ConsentJar {
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn load_in(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }
        let path = dir.join(COOKIES_FILENAME);
        let mut jar = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read cookie jar")?;
            if content.trim().is_empty() {
                Self::default()
            } else {
                serde_json::from_str(&content).context("Failed to parse cookie jar")?
            }
        } else {
            Self::default()
        };
        jar.file_path = Some(path);
        Ok(jar)
    }

    /// Like [`load_in`](Self::load_in), but an unreadable jar is logged and
    /// replaced by one that lives in memory only.
    pub fn load_or_ephemeral(dir: &Path) -> Self {
        Self::load_in(dir).unwrap_or_else(|e| {
            log::error!("Failed to load cookies from {dir:?}: {e:#}");
            Self::ephemeral()
        })
    }

    pub fn get(&self, name: &str, now: DateTime<Utc>) -> Option<&str> {
        self.cookies
            .get(name)
            .filter(|c| c.is_live(now))
            .map(|c| c.value.as_str())
    }

    pub fn set(&mut self, name: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        self.cookies.insert(
            name.to_string(),
            Cookie {
                value: value.to_string(),
                expires_at,
            },
        );
        self.save()
    }

    /// Set `cookie_consent=essential` for one year unless a live consent
    /// cookie already exists. Returns true when the cookie was written.
    pub fn ensure_essential(&mut self, now: DateTime<Utc>) -> Result<bool> {
        if self.get(CONSENT_COOKIE, now).is_some() {
            return Ok(false);
        }
        self.set(CONSENT_COOKIE, "essential", Some(now + Duration::days(365)))?;
        Ok(true)
    }

    pub fn accept_terms(&mut self) -> Result<()> {
        self.set(TERMS_COOKIE, "true", None)
    }

    pub fn terms_accepted(&self, now: DateTime<Utc>) -> bool {
        self.get(TERMS_COOKIE, now) == Some("true")
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(self).context("Failed to serialize cookies")?;
        fs::write(path, content).context("Failed to write cookie jar")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn essential_consent_set_once() {
        let mut jar = ConsentJar::ephemeral();
        let now = Utc::now();

        assert!(jar.ensure_essential(now).unwrap());
        assert!(!jar.ensure_essential(now).unwrap());
        assert_eq!(jar.get(CONSENT_COOKIE, now), Some("essential"));
    }

    #[test]
    fn consent_expires_after_a_year() {
        let mut jar = ConsentJar::ephemeral();
        let now = Utc::now();
        jar.ensure_essential(now).unwrap();

        let later = now + Duration::days(366);
        assert_eq!(jar.get(CONSENT_COOKIE, later), None);
        assert!(jar.ensure_essential(later).unwrap());
    }

    #[test]
    fn jar_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        {
            let mut jar = ConsentJar::load_in(dir.path()).unwrap();
            jar.ensure_essential(now).unwrap();
            jar.accept_terms().unwrap();
        }
        let jar = ConsentJar::load_in(dir.path()).unwrap();
        assert!(jar.terms_accepted(now));
        assert_eq!(jar.get(CONSENT_COOKIE, now), Some("essential"));
    }

    #[test]
    fn corrupt_jar_falls_back_to_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COOKIES_FILENAME);
        fs::write(&path, "{ truncated").unwrap();
        assert!(ConsentJar::load_in(dir.path()).is_err());

        let now = Utc::now();
        let mut jar = ConsentJar::load_or_ephemeral(dir.path());
        assert!(jar.ensure_essential(now).unwrap());
        assert_eq!(jar.get(CONSENT_COOKIE, now), Some("essential"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ truncated");
    }
}
