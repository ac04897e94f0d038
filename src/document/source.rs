use chrono::{DateTime, Local};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upload formats, matched on the file extension alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Doc,
    Txt,
    Jpg,
    Png,
}

impl DocumentKind {
    pub const ALLOWED_EXTENSIONS: &'static [&'static str] =
        &["pdf", "docx", "doc", "txt", "jpg", "png"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "doc" => Some(DocumentKind::Doc),
            "txt" => Some(DocumentKind::Txt),
            "jpg" => Some(DocumentKind::Jpg),
            "png" => Some(DocumentKind::Png),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Doc => "doc",
            DocumentKind::Txt => "txt",
            DocumentKind::Jpg => "jpg",
            DocumentKind::Png => "png",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DocumentKind::Txt)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unsupported file type: {name}")]
    Unsupported { name: String },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no document is loaded")]
    NothingLoaded,
}

#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub name: String,
    pub size: u64,
    pub kind: DocumentKind,
    pub bytes: Arc<[u8]>,
    pub modified: Option<DateTime<Local>>,
}

impl LoadedDocument {
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Token the renderer holds while a document is displayed. Replacing or
/// unloading the document revokes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderHandle {
    generation: u64,
}

#[derive(Default)]
pub struct DocumentSource {
    current: Option<LoadedDocument>,
    generation: u64,
}

impl DocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, path: &Path) -> Result<&LoadedDocument, DocumentError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let kind = DocumentKind::from_name(&name)
            .ok_or_else(|| DocumentError::Unsupported { name: name.clone() })?;

        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);

        info!("Opened {} ({} bytes)", path.display(), bytes.len());
        Ok(self.install(name, kind, bytes, modified))
    }

    /// Load an in-memory file, applying the same extension check as [`open`].
    ///
    /// [`open`]: DocumentSource::open
    pub fn load_bytes(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<&LoadedDocument, DocumentError> {
        let kind = DocumentKind::from_name(name).ok_or_else(|| DocumentError::Unsupported {
            name: name.to_string(),
        })?;
        Ok(self.install(name.to_string(), kind, bytes, Some(Local::now())))
    }

    fn install(
        &mut self,
        name: String,
        kind: DocumentKind,
        bytes: Vec<u8>,
        modified: Option<DateTime<Local>>,
    ) -> &LoadedDocument {
        self.generation += 1;
        self.current.insert(LoadedDocument {
            name,
            size: bytes.len() as u64,
            kind,
            bytes: Arc::from(bytes),
            modified,
        })
    }

    pub fn current(&self) -> Option<&LoadedDocument> {
        self.current.as_ref()
    }

    pub fn handle(&self) -> Option<RenderHandle> {
        self.current.as_ref().map(|_| RenderHandle {
            generation: self.generation,
        })
    }

    pub fn is_live(&self, handle: RenderHandle) -> bool {
        self.current.is_some() && handle.generation == self.generation
    }

    pub fn unload(&mut self) {
        if self.current.take().is_some() {
            self.generation += 1;
        }
    }

    /// Write the loaded bytes, unchanged, into `dir`.
    pub fn download_to(&self, dir: &Path) -> Result<PathBuf, DocumentError> {
        let doc = self.current.as_ref().ok_or(DocumentError::NothingLoaded)?;
        let target = dir.join(&doc.name);
        fs::write(&target, &doc.bytes).map_err(|source| DocumentError::Io {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert_eq!(DocumentKind::from_name("Report.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("notes.txt"), Some(DocumentKind::Txt));
        assert_eq!(DocumentKind::from_name("scan.jpg"), Some(DocumentKind::Jpg));
        assert_eq!(DocumentKind::from_name("archive.zip"), None);
        assert_eq!(DocumentKind::from_name("README"), None);
    }

    #[test]
    fn unsupported_file_leaves_previous_document() {
        let mut source = DocumentSource::new();
        source.load_bytes("a.pdf", b"%PDF".to_vec()).unwrap();

        let err = source.load_bytes("b.exe", vec![0u8; 4]).unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported { .. }));
        assert_eq!(source.current().unwrap().name, "a.pdf");
    }

    #[test]
    fn replacing_document_revokes_handle() {
        let mut source = DocumentSource::new();
        source.load_bytes("a.txt", b"one".to_vec()).unwrap();
        let first = source.handle().unwrap();
        assert!(source.is_live(first));

        source.load_bytes("b.txt", b"two".to_vec()).unwrap();
        assert!(!source.is_live(first));
        assert!(source.is_live(source.handle().unwrap()));

        source.unload();
        assert!(source.handle().is_none());
    }

    #[test]
    fn open_reads_file_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.txt");
        fs::write(&path, "hello").unwrap();

        let mut source = DocumentSource::new();
        let doc = source.open(&path).unwrap();
        assert_eq!(doc.name, "paper.txt");
        assert_eq!(doc.size, 5);
        assert_eq!(doc.stem(), "paper");
        assert!(doc.modified.is_some());
    }

    #[test]
    fn download_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let mut source = DocumentSource::new();
        assert!(matches!(
            source.download_to(dir.path()),
            Err(DocumentError::NothingLoaded)
        ));

        source.load_bytes("copy.pdf", b"%PDF-1.7".to_vec()).unwrap();
        let target = source.download_to(dir.path()).unwrap();
        assert_eq!(fs::read(target).unwrap(), b"%PDF-1.7");
    }
}
