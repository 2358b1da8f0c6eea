//! Backend commands queued from UI to backend worker.

use shared::{
    domain::{Item, ItemId},
    protocol::Draft,
};

#[derive(Debug)]
pub enum BackendCommand {
    Refresh,
    Submit,
    Delete { id: ItemId },
    BeginEdit { item: Item },
    CancelEdit,
    /// Typed text, tagged with the draft revision the form was showing.
    EditDraft { draft: Draft, base_revision: u64 },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Refresh => "refresh",
            BackendCommand::Submit => "submit",
            BackendCommand::Delete { .. } => "delete",
            BackendCommand::BeginEdit { .. } => "begin_edit",
            BackendCommand::CancelEdit => "cancel_edit",
            BackendCommand::EditDraft { .. } => "edit_draft",
        }
    }

    /// Commands that touch the network run as their own task so they can
    /// overlap; local draft edits are applied in queue order.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BackendCommand::Refresh | BackendCommand::Submit | BackendCommand::Delete { .. }
        )
    }
}
