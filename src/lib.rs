// Export modules for use in tests
pub mod annotation;
pub mod chat;
pub mod consent;
pub mod converter;
pub mod document;
pub mod editor;
pub mod event_source;
pub mod identity;
pub mod main_app;
pub mod notification;
pub mod pages;
pub mod panic_handler;
pub mod profile_store;
pub mod routes;
pub mod session;
pub mod settings;
pub mod text_override;
pub mod theme;
pub mod tool_mode;
pub mod viewer;
pub mod widget;

pub mod test_utils;

// Re-export main app components
pub use main_app::{App, AppAction, PanelFocus, run_app_with_event_source};
