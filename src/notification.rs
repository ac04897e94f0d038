use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, dismissible message shown over the current screen.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            message: message.into(),
            level,
            created_at: now,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn time_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Newest-first stack of notices. Every user-visible outcome (validation
/// failures, auth results, conversion completion) lands here.
#[derive(Debug, Default)]
pub struct Notices {
    notices: Vec<Notice>,
    default_duration: Duration,
}

impl Notices {
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_secs(5))
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            notices: Vec::new(),
            default_duration,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: NoticeLevel) {
        let notice = Notice::new(message, level, self.default_duration);
        self.notices.insert(0, notice);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, NoticeLevel::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, NoticeLevel::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, NoticeLevel::Error);
    }

    /// Remove expired notices, returns true if any were removed
    pub fn update(&mut self) -> bool {
        let initial_len = self.notices.len();
        self.notices.retain(|n| !n.is_expired());
        self.notices.len() != initial_len
    }

    pub fn current(&self) -> Option<&Notice> {
        self.notices.first()
    }

    pub fn all(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_current(&mut self) -> bool {
        if self.notices.is_empty() {
            false
        } else {
            self.notices.remove(0);
            true
        }
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    pub fn count(&self) -> usize {
        self.notices.len()
    }

    pub fn count_level(&self, level: NoticeLevel) -> usize {
        self.notices.iter().filter(|n| n.level == level).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.notices.iter().any(|n| n.message.contains(needle))
    }
}
