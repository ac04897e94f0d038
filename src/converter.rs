//! Fake conversion pipeline
//!
//! Accepts a target format and reports success after a fixed delay. No
//! bytes are transformed and nothing is written.

use std::time::{Duration, Instant};

use log::info;

use crate::notification::Notices;
use crate::settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionFormat {
    #[default]
    Docx,
    Html,
    Txt,
    Jpg,
    Png,
}

impl ConversionFormat {
    pub const ALL: [ConversionFormat; 5] = [
        ConversionFormat::Docx,
        ConversionFormat::Html,
        ConversionFormat::Txt,
        ConversionFormat::Jpg,
        ConversionFormat::Png,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionFormat::Docx => "docx",
            ConversionFormat::Html => "html",
            ConversionFormat::Txt => "txt",
            ConversionFormat::Jpg => "jpg",
            ConversionFormat::Png => "png",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConversionFormat::Docx => "Word Document (.docx)",
            ConversionFormat::Html => "Web Page (.html)",
            ConversionFormat::Txt => "Text File (.txt)",
            ConversionFormat::Jpg => "JPEG Image (.jpg)",
            ConversionFormat::Png => "PNG Image (.png)",
        }
    }

    fn offset(&self, by: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = Self::ALL.iter().position(|f| f == self).unwrap_or(0) as isize;
        Self::ALL[(index + by).rem_euclid(len) as usize]
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn prev(&self) -> Self {
        self.offset(-1)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("no file loaded to convert")]
    NoFile,
    #[error("a conversion is already running")]
    InProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    source: String,
    format: ConversionFormat,
    due: Instant,
}

/// A finished conversion; the dialog closes on receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub source: String,
    pub format: ConversionFormat,
}

impl Converted {
    pub fn message(&self) -> String {
        format!(
            "Converted {} to {} format",
            self.source,
            self.format.as_str().to_uppercase()
        )
    }
}

#[derive(Debug)]
pub struct Converter {
    selected: ConversionFormat,
    sample: Option<String>,
    job: Option<Job>,
    delay: Duration,
}

impl Converter {
    pub fn new(delay: Duration) -> Self {
        Self {
            selected: ConversionFormat::default(),
            sample: None,
            job: None,
            delay,
        }
    }

    pub fn from_settings() -> Self {
        Self::new(settings::conversion_delay())
    }

    pub fn selected(&self) -> ConversionFormat {
        self.selected
    }

    pub fn select_format(&mut self, format: ConversionFormat) {
        self.selected = format;
    }

    pub fn sample(&self) -> Option<&str> {
        self.sample.as_deref()
    }

    /// Optional example of the target format. Only its name is kept.
    pub fn attach_sample(&mut self, name: &str, notices: &mut Notices) {
        self.sample = Some(name.to_string());
        notices.success(format!("Target format file loaded: {name}"));
    }

    pub fn is_converting(&self) -> bool {
        self.job.is_some()
    }

    pub fn start(
        &mut self,
        source: Option<&str>,
        now: Instant,
        notices: &mut Notices,
    ) -> Result<(), ConvertError> {
        let Some(source) = source else {
            notices.error("No file loaded to convert");
            return Err(ConvertError::NoFile);
        };
        if self.job.is_some() {
            notices.info("A conversion is already running");
            return Err(ConvertError::InProgress);
        }
        info!("Converting {source} to {}", self.selected.as_str());
        self.job = Some(Job {
            source: source.to_string(),
            format: self.selected,
            due: now + self.delay,
        });
        Ok(())
    }

    /// Finish the running conversion once its delay has elapsed.
    pub fn poll(&mut self, now: Instant, notices: &mut Notices) -> Option<Converted> {
        if self.job.as_ref().is_none_or(|job| now < job.due) {
            return None;
        }
        let job = self.job.take()?;
        let done = Converted {
            source: job.source,
            format: job.format,
        };
        notices.success(done.message());
        self.sample = None;
        Some(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_file_is_rejected_with_notice() {
        let mut converter = Converter::new(Duration::from_secs(2));
        let mut notices = Notices::new();
        assert_eq!(
            converter.start(None, Instant::now(), &mut notices),
            Err(ConvertError::NoFile)
        );
        assert!(notices.contains("No file loaded to convert"));
        assert!(!converter.is_converting());
    }

    #[test]
    fn completes_only_after_delay() {
        let mut converter = Converter::new(Duration::from_secs(2));
        let mut notices = Notices::new();
        converter.select_format(ConversionFormat::Html);

        let t0 = Instant::now();
        converter.start(Some("report.pdf"), t0, &mut notices).unwrap();
        assert!(converter.poll(t0 + Duration::from_millis(1999), &mut notices).is_none());

        let done = converter
            .poll(t0 + Duration::from_secs(2), &mut notices)
            .unwrap();
        assert_eq!(done.message(), "Converted report.pdf to HTML format");
        assert!(notices.contains("Converted report.pdf to HTML format"));
        assert!(!converter.is_converting());
        assert!(converter.poll(t0 + Duration::from_secs(5), &mut notices).is_none());
    }

    #[test]
    fn second_start_while_running_is_refused() {
        let mut converter = Converter::new(Duration::from_secs(2));
        let mut notices = Notices::new();
        let t0 = Instant::now();
        converter.start(Some("a.pdf"), t0, &mut notices).unwrap();
        assert_eq!(
            converter.start(Some("a.pdf"), t0, &mut notices),
            Err(ConvertError::InProgress)
        );
        assert!(notices.contains("A conversion is already running"));
    }

    #[test]
    fn sample_file_is_announced() {
        let mut converter = Converter::new(Duration::ZERO);
        let mut notices = Notices::new();
        converter.attach_sample("template.docx", &mut notices);
        assert_eq!(converter.sample(), Some("template.docx"));
        assert!(notices.contains("Target format file loaded: template.docx"));
    }

    #[test]
    fn format_cycling_wraps() {
        assert_eq!(ConversionFormat::Png.next(), ConversionFormat::Docx);
        assert_eq!(ConversionFormat::Docx.prev(), ConversionFormat::Png);
        assert_eq!(ConversionFormat::Txt.label(), "Text File (.txt)");
    }
}
