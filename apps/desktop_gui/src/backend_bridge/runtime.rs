//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, ControllerEvent, HttpItemsApi, SyncController};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailed(format!(
                    "failed to build backend runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let api = match HttpItemsApi::from_settings(&settings) {
                Ok(api) => api,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::BackendFailed(err.to_string()));
                    tracing::error!("failed to build item api client: {err}");
                    return;
                }
            };
            let controller = SyncController::with_options(Arc::new(api), (&settings).into());

            let mut events = controller.subscribe();
            let ui_tx_events = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(ControllerEvent::Changed(snapshot)) => {
                            let _ = ui_tx_events.try_send(UiEvent::Snapshot(snapshot));
                        }
                        Ok(ControllerEvent::Failed(failure)) => {
                            tracing::debug!(?failure, "controller reported failure");
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "ui event forwarder lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::Info(endpoint_notice(&settings.api_url)));

            while let Ok(cmd) = cmd_rx.recv() {
                if cmd.is_remote() {
                    let controller = controller.clone();
                    tokio::spawn(async move { apply_command(&controller, cmd).await });
                } else {
                    apply_command(&controller, cmd).await;
                }
            }
        });
    });
}

/// Status line shown before the first request completes.
fn endpoint_notice(api_url: &str) -> String {
    format!("Using {api_url}")
}

async fn apply_command(controller: &SyncController, cmd: BackendCommand) {
    match cmd {
        BackendCommand::Refresh => {
            let _ = controller.refresh().await;
        }
        BackendCommand::Submit => {
            if let Err(err) = controller.submit().await {
                tracing::debug!("submit did not complete: {err}");
            }
        }
        BackendCommand::Delete { id } => {
            let _ = controller.delete(&id).await;
        }
        BackendCommand::BeginEdit { item } => controller.begin_edit(&item).await,
        BackendCommand::CancelEdit => controller.cancel_edit().await,
        BackendCommand::EditDraft {
            draft,
            base_revision,
        } => {
            controller.edit_draft(draft, base_revision).await;
        }
    }
}
