//! Document source and page extraction

mod pages;
mod source;

pub use pages::{BuiltinPages, LINES_PER_TEXT_PAGE, PageSource};
pub use source::{
    DocumentError, DocumentKind, DocumentSource, LoadedDocument, RenderHandle,
};
