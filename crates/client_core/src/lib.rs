use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Item, ItemId},
    protocol::ItemPayload,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub mod config;
pub mod controller;

pub use config::{load_settings, ClientSettings};
pub use controller::{
    ControllerEvent, ControllerOptions, ControllerSnapshot, SubmitError, SyncController,
};

const ITEMS_COLLECTION: &str = "items";

#[derive(Debug, Error)]
pub enum ItemsApiError {
    #[error("invalid api url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("api url '{0}' cannot carry path segments")]
    CannotBeBase(String),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Remote item collection. Every method maps to exactly one HTTP request.
#[async_trait]
pub trait ItemsApi: Send + Sync {
    async fn list_items(&self) -> Result<Vec<Item>>;
    async fn create_item(&self, payload: &ItemPayload) -> Result<()>;
    async fn update_item(&self, id: &ItemId, payload: &ItemPayload) -> Result<()>;
    async fn delete_item(&self, id: &ItemId) -> Result<()>;
}

/// `ItemsApi` over JSON/HTTP rooted at `{api_url}/items`.
pub struct HttpItemsApi {
    http: Client,
    base_url: Url,
}

impl HttpItemsApi {
    pub fn new(api_url: &str) -> Result<Self, ItemsApiError> {
        Self::with_client(api_url, Client::new())
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ItemsApiError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self::with_client(&settings.api_url, builder.build()?)
    }

    pub fn with_client(api_url: &str, http: Client) -> Result<Self, ItemsApiError> {
        let base_url = Url::parse(api_url).map_err(|source| ItemsApiError::InvalidBaseUrl {
            url: api_url.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ItemsApiError::CannotBeBase(api_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn collection_url(&self) -> Result<Url, ItemsApiError> {
        self.url_for(&[ITEMS_COLLECTION])
    }

    pub fn item_url(&self, id: &ItemId) -> Result<Url, ItemsApiError> {
        self.url_for(&[ITEMS_COLLECTION, id.as_str()])
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, ItemsApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ItemsApiError::CannotBeBase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ItemsApi for HttpItemsApi {
    async fn list_items(&self) -> Result<Vec<Item>> {
        let url = self.collection_url()?;
        let items: Vec<Item> = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("invalid item list from {url}"))?;
        debug!(count = items.len(), "fetched items");
        Ok(items)
    }

    async fn create_item(&self, payload: &ItemPayload) -> Result<()> {
        let url = self.collection_url()?;
        self.http
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()?;
        Ok(())
    }

    async fn update_item(&self, id: &ItemId, payload: &ItemPayload) -> Result<()> {
        let url = self.item_url(id)?;
        self.http
            .put(url.clone())
            .json(payload)
            .send()
            .await
            .with_context(|| format!("PUT {url}"))?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<()> {
        let url = self.item_url(id)?;
        self.http
            .delete(url.clone())
            .send()
            .await
            .with_context(|| format!("DELETE {url}"))?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
