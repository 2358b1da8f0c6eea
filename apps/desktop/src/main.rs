use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{config::normalize_api_url, load_settings, HttpItemsApi, SyncController};
use shared::{
    domain::{Item, ItemId},
    protocol::Draft,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Manage items on a remote item collection")]
struct Args {
    /// Base url of the item API, e.g. http://localhost:5000/api
    #[arg(long)]
    api_url: Option<String>,
    /// Print the refreshed list as JSON
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        price: f64,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = &args.api_url {
        settings.api_url = normalize_api_url(api_url);
    }
    let api = HttpItemsApi::from_settings(&settings)?;
    let controller = SyncController::with_options(Arc::new(api), (&settings).into());

    match args.command {
        Command::List => {
            let _ = controller.refresh().await;
        }
        Command::Add {
            name,
            description,
            price,
        } => {
            controller
                .replace_draft(Draft {
                    name,
                    description,
                    price: Some(price),
                })
                .await;
            if let Err(err) = controller.submit().await {
                tracing::debug!("submit failed: {err}");
            }
        }
        Command::Update {
            id,
            name,
            description,
            price,
        } => {
            let id = ItemId::new(id);
            if controller.refresh().await.is_ok() {
                if !controller.begin_edit_by_id(&id).await {
                    bail!("item {id} not found");
                }
                let mut draft = controller.snapshot().await.draft;
                if let Some(name) = name {
                    draft.name = name;
                }
                if let Some(description) = description {
                    draft.description = description;
                }
                if price.is_some() {
                    draft.price = price;
                }
                controller.replace_draft(draft).await;
                if let Err(err) = controller.submit().await {
                    tracing::debug!("submit failed: {err}");
                }
            }
        }
        Command::Delete { id } => {
            let _ = controller.delete(&ItemId::new(id)).await;
        }
    }

    let snapshot = controller.snapshot().await;
    if let Some(message) = snapshot.error_message() {
        bail!(message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.items)?);
    } else if snapshot.items.is_empty() {
        println!("No items.");
    } else {
        for item in &snapshot.items {
            println!("{}", format_item(item));
        }
    }

    Ok(())
}

fn format_item(item: &Item) -> String {
    format!(
        "[{}] {} - {} - ${}",
        item.id, item.name, item.description, item.price
    )
}
