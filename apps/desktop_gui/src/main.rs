mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{config::normalize_api_url, load_settings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::ItemsApp;

#[derive(Parser, Debug)]
struct Args {
    /// Base url of the item API, e.g. http://localhost:5000/api
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = &args.api_url {
        settings.api_url = normalize_api_url(api_url);
    }
    tracing::info!(api_url = %settings.api_url, "starting item client");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CRUD App")
            .with_inner_size([640.0, 720.0])
            .with_min_inner_size([420.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "CRUD App",
        options,
        Box::new(move |_cc| Ok(Box::new(ItemsApp::new(cmd_tx, ui_rx)))),
    )
}
