//! Editor session
//!
//! Everything the `/editor` screen owns, independent of the terminal: the
//! loaded document, view state, annotation overlay, tool mode, the open
//! dialogs and the notices they raise. The front end maps input onto these
//! methods and draws what they expose.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::annotation::{
    Annotation, AnnotationDraft, AnnotationId, AnnotationLayer, EditOutcome, PagePoint,
};
use crate::chat::{
    AiModel, AssistantChat, ChatAttachment, ChatError, CodeLanguage, DeveloperChat, SendOutcome,
};
use crate::converter::{ConvertError, Converted, Converter};
use crate::document::{
    BuiltinPages, DocumentError, DocumentKind, DocumentSource, LoadedDocument, PageSource,
    RenderHandle,
};
use crate::notification::Notices;
use crate::settings;
use crate::text_override::TextOverrides;
use crate::tool_mode::{CanvasAction, ToolController, ToolMode};
use crate::viewer::{Command, Effect, ViewState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentProperties {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub protected: bool,
}

impl DocumentProperties {
    pub fn for_document(doc: &LoadedDocument) -> Self {
        Self {
            title: doc.stem().to_string(),
            author: "Unknown".to_string(),
            subject: String::new(),
            keywords: String::new(),
            protected: false,
        }
    }

    pub fn field_mut(&mut self, field: PropertyField) -> &mut String {
        match field {
            PropertyField::Title => &mut self.title,
            PropertyField::Author => &mut self.author,
            PropertyField::Subject => &mut self.subject,
            PropertyField::Keywords => &mut self.keywords,
        }
    }

    pub fn field(&self, field: PropertyField) -> &str {
        match field {
            PropertyField::Title => &self.title,
            PropertyField::Author => &self.author,
            PropertyField::Subject => &self.subject,
            PropertyField::Keywords => &self.keywords,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyField {
    Title,
    Author,
    Subject,
    Keywords,
}

impl PropertyField {
    pub const ALL: [PropertyField; 4] = [
        PropertyField::Title,
        PropertyField::Author,
        PropertyField::Subject,
        PropertyField::Keywords,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PropertyField::Title => "Title",
            PropertyField::Author => "Author",
            PropertyField::Subject => "Subject",
            PropertyField::Keywords => "Keywords",
        }
    }
}

/// A comment waiting for its text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentPrompt {
    pub page: usize,
    pub at: PagePoint,
}

pub struct Editor {
    documents: DocumentSource,
    pages: Box<dyn PageSource>,
    view: ViewState,
    annotations: AnnotationLayer,
    overrides: TextOverrides,
    tools: ToolController,
    converter: Converter,
    converter_open: bool,
    comment_prompt: Option<CommentPrompt>,
    properties: Option<DocumentProperties>,
    properties_open: bool,
    assistant: Option<AssistantChat>,
    developer: Option<DeveloperChat>,
    chat_delay: Duration,
    notices: Notices,
}

impl Editor {
    pub fn new(pages: Box<dyn PageSource>, converter: Converter, chat_delay: Duration) -> Self {
        Self {
            documents: DocumentSource::new(),
            pages,
            view: ViewState::new(),
            annotations: AnnotationLayer::new(),
            overrides: TextOverrides::new(),
            tools: ToolController::new(),
            converter,
            converter_open: false,
            comment_prompt: None,
            properties: None,
            properties_open: false,
            assistant: None,
            developer: None,
            chat_delay,
            notices: Notices::with_default_duration(settings::notice_duration()),
        }
    }

    pub fn from_settings() -> Self {
        Self::new(
            Box::new(BuiltinPages),
            Converter::from_settings(),
            settings::chat_delay(),
        )
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.documents.current()
    }

    pub fn render_handle(&self) -> Option<RenderHandle> {
        self.documents.handle()
    }

    pub fn is_handle_live(&self, handle: RenderHandle) -> bool {
        self.documents.is_live(handle)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tools.mode()
    }

    // Document lifecycle

    pub fn open_file(&mut self, path: &Path) -> Result<(), DocumentError> {
        let result = self.documents.open(path).map(|doc| doc.clone());
        self.after_load(result)
    }

    pub fn load_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), DocumentError> {
        let result = self.documents.load_bytes(name, bytes).map(|doc| doc.clone());
        self.after_load(result)
    }

    fn after_load(
        &mut self,
        loaded: Result<LoadedDocument, DocumentError>,
    ) -> Result<(), DocumentError> {
        match loaded {
            Ok(doc) => {
                let page_count = self.pages.page_count(&doc);
                let _ = self.view.apply(Command::Reset { page_count });
                self.overrides.clear_all();
                self.properties = Some(DocumentProperties::for_document(&doc));
                info!("Loaded {} with {page_count} page(s)", doc.name);
                self.notices.success(format!("File loaded: {}", doc.name));
                Ok(())
            }
            Err(e @ DocumentError::Unsupported { .. }) => {
                warn!("{e}");
                self.notices.error(format!(
                    "Please select a valid document ({})",
                    DocumentKind::ALLOWED_EXTENSIONS.join(", ")
                ));
                Err(e)
            }
            Err(e) => {
                error!("Error loading document: {e}");
                self.notices.error("Error loading document");
                Err(e)
            }
        }
    }

    pub fn save(&mut self) {
        self.notices.success("Document saved");
    }

    pub fn download_to(&mut self, dir: &Path) -> Option<PathBuf> {
        match self.documents.download_to(dir) {
            Ok(path) => {
                info!("Downloaded document to {}", path.display());
                self.notices.success("Document downloaded");
                Some(path)
            }
            Err(DocumentError::NothingLoaded) => {
                self.notices.error("No document to download");
                None
            }
            Err(e) => {
                error!("Error downloading document: {e}");
                self.notices.error("Failed to download document");
                None
            }
        }
    }

    // Viewing

    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        self.view.apply(cmd)
    }

    /// Annotations drawn over the current page
    pub fn visible_annotations(&self) -> Vec<&Annotation> {
        self.annotations.by_page(self.view.current_page)
    }

    /// Text runs of the current page with user edits applied
    pub fn page_text(&self) -> Option<Vec<String>> {
        let doc = self.documents.current()?;
        let page = self.view.current_page;
        let runs = self.pages.page_text(doc, page)?;
        Some(self.overrides.apply(page, &runs))
    }

    pub fn override_text(&mut self, index: usize, text: impl Into<String>) {
        self.overrides.set(self.view.current_page, index, text);
    }

    pub fn clear_override(&mut self, index: usize) -> bool {
        self.overrides.clear(self.view.current_page, index)
    }

    // Tools and canvas

    pub fn select_tool(&mut self, mode: ToolMode) {
        let change = self.tools.select(mode);
        self.notices.info(change.notice);
        if change.open_converter {
            self.open_converter();
        }
    }

    /// Handle a click on the page canvas. An open text edit is committed by
    /// the click instead of starting something new.
    pub fn click(&mut self, at: PagePoint) -> CanvasAction {
        if self.documents.current().is_none() {
            return CanvasAction::None;
        }
        if self.annotations.active_edit().is_some() {
            self.commit_text_edit();
            return CanvasAction::None;
        }

        let action = self.tools.dispatch_click(self.view.current_page, at);
        match action {
            CanvasAction::AddHighlight { page, at } => {
                self.annotations.add(AnnotationDraft::highlight(page, at));
                self.notices.info("Highlight added");
            }
            CanvasAction::PromptComment { page, at } => {
                self.comment_prompt = Some(CommentPrompt { page, at });
            }
            CanvasAction::OpenTextEditor { page, at } => {
                self.annotations.begin_text_edit(page, at);
            }
            CanvasAction::None => {}
        }
        action
    }

    pub fn comment_prompt(&self) -> Option<CommentPrompt> {
        self.comment_prompt
    }

    /// Answer the comment prompt. `None` or an empty answer adds nothing.
    pub fn answer_comment(&mut self, text: Option<&str>) -> Option<Annotation> {
        let prompt = self.comment_prompt.take()?;
        let text = text.filter(|t| !t.is_empty())?;
        let comment = self
            .annotations
            .add(AnnotationDraft::comment(prompt.page, prompt.at, text));
        self.notices.info("Comment added");
        Some(comment)
    }

    pub fn set_edit_text(&mut self, text: impl Into<String>) {
        self.annotations.set_active_text(text);
    }

    pub fn edit_existing(&mut self, id: AnnotationId) -> bool {
        self.annotations.edit_text(id)
    }

    pub fn commit_text_edit(&mut self) -> EditOutcome {
        let outcome = self.annotations.commit_edit();
        if let EditOutcome::Committed(_) = outcome {
            self.notices.info("Text added");
        }
        outcome
    }

    pub fn cancel_text_edit(&mut self) {
        self.annotations.cancel_edit();
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let removed = self.annotations.remove(id);
        if removed.is_some() {
            self.notices.info("Annotation removed");
        }
        removed
    }

    // Properties panel

    pub fn properties(&self) -> Option<&DocumentProperties> {
        self.properties.as_ref()
    }

    pub fn properties_open(&self) -> bool {
        self.properties_open && self.properties.is_some()
    }

    pub fn toggle_properties(&mut self) {
        self.properties_open = !self.properties_open;
    }

    pub fn set_property(&mut self, field: PropertyField, value: impl Into<String>) {
        if let Some(props) = self.properties.as_mut() {
            *props.field_mut(field) = value.into();
        }
    }

    pub fn toggle_protection(&mut self) {
        if let Some(props) = self.properties.as_mut() {
            props.protected = !props.protected;
        }
    }

    pub fn save_properties(&mut self) {
        if self.properties.is_some() {
            self.notices.success("Document properties updated");
        }
    }

    // Conversion dialog

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut Converter {
        &mut self.converter
    }

    pub fn converter_open(&self) -> bool {
        self.converter_open
    }

    pub fn open_converter(&mut self) {
        self.converter_open = true;
    }

    pub fn close_converter(&mut self) {
        self.converter_open = false;
    }

    pub fn attach_conversion_sample(&mut self, name: &str) {
        self.converter.attach_sample(name, &mut self.notices);
    }

    pub fn start_conversion(&mut self, now: Instant) -> Result<(), ConvertError> {
        let source = self.documents.current().map(|doc| doc.name.as_str());
        self.converter.start(source, now, &mut self.notices)
    }

    // Chat panels

    /// Open the AI assistant with an empty conversation.
    pub fn open_assistant(&mut self) {
        let model = AiModel::parse(&settings::default_model_name()).unwrap_or_default();
        self.assistant = Some(AssistantChat::new(model, self.chat_delay));
    }

    pub fn close_assistant(&mut self) {
        self.assistant = None;
    }

    pub fn assistant(&self) -> Option<&AssistantChat> {
        self.assistant.as_ref()
    }

    pub fn assistant_mut(&mut self) -> Option<&mut AssistantChat> {
        self.assistant.as_mut()
    }

    pub fn send_to_assistant(
        &mut self,
        text: &str,
        attachments: Vec<ChatAttachment>,
    ) -> Result<(), ChatError> {
        let Some(chat) = self.assistant.as_mut() else {
            return Err(ChatError::NotOpen);
        };
        chat.send(text, attachments, &mut self.notices)
    }

    pub fn open_developer(&mut self) {
        self.developer = Some(DeveloperChat::new(self.chat_delay));
    }

    pub fn close_developer(&mut self) {
        self.developer = None;
    }

    pub fn developer(&self) -> Option<&DeveloperChat> {
        self.developer.as_ref()
    }

    pub fn developer_mut(&mut self) -> Option<&mut DeveloperChat> {
        self.developer.as_mut()
    }

    pub fn send_to_developer(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        let Some(chat) = self.developer.as_mut() else {
            return Err(ChatError::NotOpen);
        };
        chat.send(text, &mut self.notices)
    }

    pub fn confirm_developer_language(
        &mut self,
        language: CodeLanguage,
    ) -> Result<(), ChatError> {
        match self.developer.as_mut() {
            Some(chat) => chat.confirm_language(language, &mut self.notices),
            None => Err(ChatError::NotOpen),
        }
    }

    pub fn run_developer_code(&mut self) -> bool {
        match self.developer.as_mut() {
            Some(chat) => chat.run_code(&mut self.notices),
            None => false,
        }
    }

    // Timers

    /// Advance timers and drain finished background work. Returns true when
    /// anything changed and the screen should be redrawn.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.notices.update();

        if let Some(done) = self.converter.poll(now, &mut self.notices) {
            self.finish_conversion(done);
            changed = true;
        }
        if let Some(chat) = self.assistant.as_mut() {
            changed |= chat.poll() > 0;
        }
        if let Some(chat) = self.developer.as_mut() {
            changed |= chat.poll() > 0;
        }
        changed
    }

    fn finish_conversion(&mut self, done: Converted) {
        info!("{}", done.message());
        self.converter_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;
    use tempfile::TempDir;

    fn editor() -> Editor {
        Editor::new(
            Box::new(BuiltinPages),
            Converter::new(Duration::from_secs(2)),
            Duration::from_millis(20),
        )
    }

    fn three_page_text() -> Vec<u8> {
        b"one\x0ctwo\x0cthree".to_vec()
    }

    #[test]
    fn loading_resets_to_first_page_and_announces() {
        let mut editor = editor();
        editor.load_bytes("notes.txt", three_page_text()).unwrap();
        let _ = editor.apply(Command::GoToPage(3));

        editor.load_bytes("again.txt", three_page_text()).unwrap();
        assert_eq!(editor.view().current_page, 1);
        assert_eq!(editor.view().page_count, 3);
        assert!(editor.notices().contains("File loaded: again.txt"));
    }

    #[test]
    fn unsupported_file_keeps_current_document() {
        let mut editor = editor();
        editor.load_bytes("notes.txt", three_page_text()).unwrap();
        assert!(editor.load_bytes("virus.exe", vec![1, 2]).is_err());
        assert_eq!(editor.document().unwrap().name, "notes.txt");
        assert!(editor.notices().contains("Please select a valid document"));
    }

    #[test]
    fn clicks_without_document_do_nothing() {
        let mut editor = editor();
        editor.select_tool(ToolMode::Highlight);
        assert_eq!(editor.click(PagePoint::new(1.0, 1.0)), CanvasAction::None);
        assert!(editor.annotations().is_empty());
    }

    #[test]
    fn highlight_stays_on_its_page() {
        let mut editor = editor();
        editor.load_bytes("notes.txt", three_page_text()).unwrap();
        editor.select_tool(ToolMode::Highlight);
        let _ = editor.apply(Command::GoToPage(2));
        editor.click(PagePoint::new(10.0, 20.0));

        let _ = editor.apply(Command::PrevPage);
        assert!(editor.visible_annotations().is_empty());
        let _ = editor.apply(Command::NextPage);
        let visible = editor.visible_annotations();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, AnnotationKind::Highlight);
    }

    #[test]
    fn comment_needs_non_empty_answer() {
        let mut editor = editor();
        editor.load_bytes("notes.txt", three_page_text()).unwrap();
        editor.select_tool(ToolMode::Comment);

        editor.click(PagePoint::new(1.0, 2.0));
        assert!(editor.answer_comment(Some("")).is_none());
        assert!(editor.comment_prompt().is_none());

        editor.click(PagePoint::new(1.0, 2.0));
        assert!(editor.answer_comment(None).is_none());

        editor.click(PagePoint::new(1.0, 2.0));
        let comment = editor.answer_comment(Some("check this")).unwrap();
        assert_eq!(comment.content.as_deref(), Some("check this"));
        assert_eq!(editor.annotations().len(), 1);
    }

    #[test]
    fn click_outside_commits_open_text_edit() {
        let mut editor = editor();
        editor.load_bytes("notes.txt", three_page_text()).unwrap();
        editor.select_tool(ToolMode::Text);

        editor.click(PagePoint::new(4.0, 4.0));
        editor.set_edit_text("inserted");
        assert_eq!(editor.click(PagePoint::new(50.0, 50.0)), CanvasAction::None);
        assert_eq!(editor.annotations().len(), 1);
        assert!(editor.annotations().active_edit().is_none());
    }

    #[test]
    fn convert_tool_opens_dialog_and_finishes_after_delay() {
        let mut editor = editor();
        editor.load_bytes("report.pdf", b"%PDF".to_vec()).unwrap();
        editor.select_tool(ToolMode::Convert);
        assert!(editor.converter_open());
        assert_eq!(editor.tool_mode(), ToolMode::Select);

        let t0 = Instant::now();
        editor.start_conversion(t0).unwrap();
        editor.tick(t0 + Duration::from_secs(1));
        assert!(editor.converter_open());
        editor.tick(t0 + Duration::from_secs(2));
        assert!(!editor.converter_open());
        assert!(editor.notices().contains("Converted report.pdf to DOCX format"));
    }

    #[test]
    fn text_overrides_apply_to_current_page() {
        let mut editor = editor();
        editor.load_bytes("notes.txt", b"alpha\nbeta\x0cgamma".to_vec()).unwrap();
        editor.override_text(1, "BETA");
        assert_eq!(
            editor.page_text().unwrap(),
            vec!["alpha".to_string(), "BETA".to_string()]
        );
        let _ = editor.apply(Command::NextPage);
        assert_eq!(editor.page_text().unwrap(), vec!["gamma".to_string()]);
    }

    #[test]
    fn properties_start_from_file_name() {
        let mut editor = editor();
        editor.load_bytes("Quarterly Report.pdf", b"%PDF".to_vec()).unwrap();
        let props = editor.properties().unwrap();
        assert_eq!(props.title, "Quarterly Report");
        assert_eq!(props.author, "Unknown");
        assert!(!props.protected);

        editor.set_property(PropertyField::Author, "Ada");
        editor.save_properties();
        assert_eq!(editor.properties().unwrap().author, "Ada");
        assert!(editor.notices().contains("Document properties updated"));
    }

    #[test]
    fn download_without_document_warns() {
        let dir = TempDir::new().unwrap();
        let mut editor = editor();
        assert!(editor.download_to(dir.path()).is_none());
        assert!(editor.notices().contains("No document to download"));

        editor.load_bytes("a.pdf", b"%PDF".to_vec()).unwrap();
        let path = editor.download_to(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
    }

    #[test]
    fn reopening_assistant_clears_history() {
        let mut editor = editor();
        editor.open_assistant();
        editor.assistant_mut().unwrap().set_api_key("k");
        editor.send_to_assistant("hi", Vec::new()).unwrap();
        assert_eq!(editor.assistant().unwrap().messages().len(), 1);

        editor.close_assistant();
        editor.open_assistant();
        assert!(editor.assistant().unwrap().messages().is_empty());
    }

    #[test]
    fn annotations_survive_document_replacement() {
        let mut editor = editor();
        editor.load_bytes("long.txt", three_page_text()).unwrap();
        editor.select_tool(ToolMode::Highlight);
        let _ = editor.apply(Command::GoToPage(3));
        editor.click(PagePoint::new(0.0, 0.0));

        editor.load_bytes("short.txt", b"only".to_vec()).unwrap();
        assert_eq!(editor.annotations().len(), 1);
        assert!(editor.visible_annotations().is_empty());
    }
}
