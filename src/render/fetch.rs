//! Image resolution: fetches and decodes external image resources.
//!
//! `RenderContext` carries the shared infrastructure a render needs —
//! HTTP client, decoded-image cache, registered fonts — so the renderer
//! itself stays unaware of where bytes come from. `http(s)://` references
//! go through the HTTP client; anything else is read as a local file
//! path, which keeps tests and offline CLI runs free of the network.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use image::DynamicImage;

use crate::error::EngineError;

use super::text::FontStore;

/// Shared resources available while rendering cards and composing sheets.
///
/// Constructed once per batch (or per process) and passed by reference;
/// the cache means a watermark or a template logo decodes exactly once
/// per document no matter how many cards reference it.
pub struct RenderContext {
    /// HTTP client for downloading external resources.
    pub http_client: reqwest::Client,
    /// Decoded images keyed by their reference string.
    image_cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
    /// Registered TTF fonts for text nodes.
    pub fonts: FontStore,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .user_agent(concat!("cardpress/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build HTTP client"),
            image_cache: Arc::new(RwLock::new(HashMap::new())),
            fonts: FontStore::new(),
        }
    }

    /// Register a TTF font under the name text nodes reference.
    pub fn register_font(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), EngineError> {
        self.fonts.register(name, bytes)
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch and decode an image by reference, using the context's cache.
///
/// `http://` and `https://` references download through the context's
/// HTTP client; every other reference is treated as a file path.
pub async fn fetch_image(reference: &str, ctx: &RenderContext) -> Result<DynamicImage, EngineError> {
    {
        let cache = ctx.image_cache.read().await;
        if let Some(image) = cache.get(reference) {
            return Ok(image.clone());
        }
    }

    let bytes = if reference.starts_with("http://") || reference.starts_with("https://") {
        let response = ctx
            .http_client
            .get(reference)
            .send()
            .await
            .map_err(|e| EngineError::PhotoLoad(format!("failed to download {reference}: {e}")))?;
        if !response.status().is_success() {
            return Err(EngineError::PhotoLoad(format!(
                "failed to download {reference}: HTTP {}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map_err(|e| EngineError::PhotoLoad(format!("failed to read {reference}: {e}")))?
            .to_vec()
    } else {
        tokio::fs::read(reference)
            .await
            .map_err(|e| EngineError::PhotoLoad(format!("failed to read {reference}: {e}")))?
    };

    let image = image::load_from_memory(&bytes)
        .map_err(|e| EngineError::PhotoLoad(format!("failed to decode {reference}: {e}")))?;

    let mut cache = ctx.image_cache.write().await;
    cache.insert(reference.to_string(), image.clone());
    Ok(image)
}
