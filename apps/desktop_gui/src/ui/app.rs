use std::time::Duration;

use client_core::ControllerSnapshot;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Item;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::UiEvent, form::FormState, orchestration::dispatch_backend_command,
};

const FORM_WIDTH: f32 = 600.0;

pub struct ItemsApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshot: ControllerSnapshot,
    form: FormState,
    status: String,
}

impl ItemsApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            snapshot: ControllerSnapshot::default(),
            form: FormState::default(),
            status: "Starting backend...".to_string(),
        };
        app.dispatch(BackendCommand::Refresh);
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::BackendFailed(message) => {
                    self.status = format!("Backend unavailable: {message}");
                }
                UiEvent::Snapshot(snapshot) => {
                    self.form.apply_snapshot(&snapshot);
                    self.snapshot = snapshot;
                }
            }
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;
        changed |= ui
            .add(
                egui::TextEdit::singleline(&mut self.form.name)
                    .hint_text("Name")
                    .desired_width(f32::INFINITY),
            )
            .changed();
        changed |= ui
            .add(
                egui::TextEdit::singleline(&mut self.form.description)
                    .hint_text("Description")
                    .desired_width(f32::INFINITY),
            )
            .changed();
        changed |= ui
            .add(
                egui::TextEdit::singleline(&mut self.form.price)
                    .hint_text("Price")
                    .desired_width(f32::INFINITY),
            )
            .changed();
        if changed {
            let draft = self.form.to_draft();
            let base_revision = self.form.revision();
            self.dispatch(BackendCommand::EditDraft {
                draft,
                base_revision,
            });
        }

        let editing = self.snapshot.is_editing();
        let submit_label = if editing { "Update Item" } else { "Add Item" };
        let can_submit = self.form.can_submit();
        let mut submit = false;
        let mut cancel = false;
        ui.horizontal(|ui| {
            submit = ui
                .add_enabled(can_submit, egui::Button::new(submit_label))
                .clicked();
            if editing {
                cancel = ui.button("Cancel").clicked();
            }
        });
        if submit {
            self.dispatch(BackendCommand::Submit);
        }
        if cancel {
            self.dispatch(BackendCommand::CancelEdit);
        }
    }

    fn show_items(&mut self, ui: &mut egui::Ui) {
        if self.snapshot.sync_state.is_loading() {
            ui.vertical_centered(|ui| ui.label("Loading..."));
            return;
        }

        let mut pending = Vec::new();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for item in &self.snapshot.items {
                ui.horizontal(|ui| {
                    ui.strong(&item.name);
                    ui.label(item_details(item));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Delete").clicked() {
                            pending.push(BackendCommand::Delete {
                                id: item.id.clone(),
                            });
                        }
                        if ui.button("Edit").clicked() {
                            pending.push(BackendCommand::BeginEdit { item: item.clone() });
                        }
                    });
                });
                ui.separator();
            }
        });
        for cmd in pending {
            self.dispatch(cmd);
        }
    }
}

fn item_details(item: &Item) -> String {
    format!("- {} - ${}", item.description, item.price)
}

impl eframe::App for ItemsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.set_max_width(FORM_WIDTH);
            ui.vertical_centered(|ui| ui.heading("CRUD App"));
            if let Some(message) = self.snapshot.error_message() {
                ui.vertical_centered(|ui| ui.colored_label(egui::Color32::RED, message));
            }
            ui.add_space(8.0);
            self.show_form(ui);
            ui.add_space(12.0);
            self.show_items(ui);
            ui.add_space(8.0);
            ui.weak(&self.status);
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::ControllerSnapshot;
    use crossbeam_channel::bounded;
    use shared::{
        domain::{ItemId, SyncState},
        error::SyncFailure,
        protocol::Draft,
    };

    #[test]
    fn renders_item_details_like_the_list_row() {
        let item = Item {
            id: ItemId::new("abc"),
            name: "Pen".to_string(),
            description: "Blue pen".to_string(),
            price: 2.0,
        };
        assert_eq!(item_details(&item), "- Blue pen - $2");
    }

    #[test]
    fn startup_queues_initial_refresh() {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (_ui_tx, ui_rx) = bounded(8);
        let _app = ItemsApp::new(cmd_tx, ui_rx);
        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::Refresh)));
    }

    #[test]
    fn snapshots_update_view_state_and_form() {
        let (cmd_tx, _cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let mut app = ItemsApp::new(cmd_tx, ui_rx);

        ui_tx
            .send(UiEvent::Snapshot(ControllerSnapshot {
                draft: Draft {
                    name: "Cup".to_string(),
                    description: "Mug".to_string(),
                    price: Some(4.5),
                },
                draft_revision: 1,
                edit_target: Some(ItemId::new("a")),
                sync_state: SyncState::Loading,
                error: Some(SyncFailure::Update),
                ..ControllerSnapshot::default()
            }))
            .expect("send");
        app.process_ui_events();

        assert!(app.snapshot.is_editing());
        assert_eq!(app.snapshot.error_message(), Some("Failed to update item"));
        assert_eq!(app.form.name, "Cup");
        assert_eq!(app.form.price, "4.5");
    }
}
