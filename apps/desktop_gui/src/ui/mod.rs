//! UI layer for the desktop GUI: connect screen, profile card and tab views.

pub mod app;

pub use app::DesktopGuiApp;
