//! Backend-to-UI events for the desktop GUI.

use client_core::ControllerSnapshot;

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Snapshot(ControllerSnapshot),
    BackendFailed(String),
}
