//! UI layer for the desktop GUI: the single-page item form and list.

pub mod app;

pub use app::ItemsApp;
