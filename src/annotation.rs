//! Annotation overlay
//!
//! An in-memory, insertion-ordered list of marks positioned on document
//! pages. Nothing here is persisted; the list lives as long as the editor.
//! Coordinates are page-local and unscaled.

use chrono::Utc;
use log::debug;

pub type AnnotationId = i64;

pub const HIGHLIGHT_WIDTH: f32 = 100.0;
pub const HIGHLIGHT_HEIGHT: f32 = 20.0;
pub const HIGHLIGHT_COLOR: &str = "rgba(255, 255, 0, 0.3)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Highlight,
    Comment,
    TextEdit,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Comment => "comment",
            AnnotationKind::TextEdit => "text-edit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    /// 1-based page number
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub color: Option<String>,
}

/// An annotation before it has been given an id
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub kind: AnnotationKind,
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub color: Option<String>,
}

impl AnnotationDraft {
    /// The fixed-size yellow box a highlight click produces.
    pub fn highlight(page: usize, at: PagePoint) -> Self {
        Self {
            kind: AnnotationKind::Highlight,
            page,
            x: at.x,
            y: at.y,
            width: Some(HIGHLIGHT_WIDTH),
            height: Some(HIGHLIGHT_HEIGHT),
            content: None,
            color: Some(HIGHLIGHT_COLOR.to_string()),
        }
    }

    pub fn comment(page: usize, at: PagePoint, text: impl Into<String>) -> Self {
        Self {
            kind: AnnotationKind::Comment,
            page,
            x: at.x,
            y: at.y,
            width: None,
            height: None,
            content: Some(text.into()),
            color: None,
        }
    }

    pub fn text_edit(page: usize, at: PagePoint) -> Self {
        Self {
            kind: AnnotationKind::TextEdit,
            page,
            x: at.x,
            y: at.y,
            width: None,
            height: None,
            content: Some(String::new()),
            color: None,
        }
    }

    fn into_annotation(self, id: AnnotationId) -> Annotation {
        Annotation {
            id,
            kind: self.kind,
            page: self.page,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            content: self.content,
            color: self.color,
        }
    }
}

/// Millisecond timestamps, bumped when two ids land in the same millisecond.
#[derive(Debug, Default)]
struct IdClock {
    last: AnnotationId,
}

impl IdClock {
    fn next_at(&mut self, now_ms: AnnotationId) -> AnnotationId {
        self.last = now_ms.max(self.last + 1);
        self.last
    }

    fn next(&mut self) -> AnnotationId {
        self.next_at(Utc::now().timestamp_millis())
    }
}

/// The text-edit currently open in the editor
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEdit {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
    /// The committed record this edit was popped from
    origin: Option<Annotation>,
}

impl ActiveEdit {
    pub fn is_new(&self) -> bool {
        self.origin.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Committed(Annotation),
    /// Blank content; nothing was added
    Discarded,
    NoActiveEdit,
}

#[derive(Debug, Default)]
pub struct AnnotationLayer {
    items: Vec<Annotation>,
    active: Option<ActiveEdit>,
    ids: IdClock,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, draft: AnnotationDraft) -> Annotation {
        let annotation = draft.into_annotation(self.ids.next());
        debug!(
            "Added {} annotation {} on page {}",
            annotation.kind.as_str(),
            annotation.id,
            annotation.page
        );
        self.items.push(annotation.clone());
        annotation
    }

    /// Open an empty text-edit at `at`. Any edit already open is cancelled.
    pub fn begin_text_edit(&mut self, page: usize, at: PagePoint) {
        self.cancel_edit();
        self.active = Some(ActiveEdit {
            page,
            x: at.x,
            y: at.y,
            text: String::new(),
            origin: None,
        });
    }

    /// Move a committed text-edit back into the edit slot. Returns false for
    /// unknown ids and for annotations of other kinds.
    pub fn edit_text(&mut self, id: AnnotationId) -> bool {
        let Some(index) = self
            .items
            .iter()
            .position(|a| a.id == id && a.kind == AnnotationKind::TextEdit)
        else {
            return false;
        };
        self.cancel_edit();
        let origin = self.items.remove(index);
        self.active = Some(ActiveEdit {
            page: origin.page,
            x: origin.x,
            y: origin.y,
            text: origin.content.clone().unwrap_or_default(),
            origin: Some(origin),
        });
        true
    }

    pub fn set_active_text(&mut self, text: impl Into<String>) {
        if let Some(active) = self.active.as_mut() {
            active.text = text.into();
        }
    }

    pub fn active_edit(&self) -> Option<&ActiveEdit> {
        self.active.as_ref()
    }

    pub fn commit_edit(&mut self) -> EditOutcome {
        let Some(active) = self.active.take() else {
            return EditOutcome::NoActiveEdit;
        };
        if active.text.trim().is_empty() {
            return EditOutcome::Discarded;
        }
        let draft = AnnotationDraft {
            content: Some(active.text),
            ..AnnotationDraft::text_edit(active.page, PagePoint::new(active.x, active.y))
        };
        EditOutcome::Committed(self.add(draft))
    }

    /// Drop the open edit. A popped record goes back to the end of the list
    /// with its id and content unchanged.
    pub fn cancel_edit(&mut self) {
        if let Some(ActiveEdit {
            origin: Some(origin),
            ..
        }) = self.active.take()
        {
            self.items.push(origin);
        }
    }

    pub fn by_page(&self, page: usize) -> Vec<&Annotation> {
        self.items.iter().filter(|a| a.page == page).collect()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.items.iter().find(|a| a.id == id)
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn all(&self) -> &[Annotation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
