use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::config::BoardOptions;
use crate::error::{PhotoBoardError, Result};
use crate::id::ResourceId;

/// Remote fetch collaborator: raw bytes for a locator, exactly once per call.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch<'a>(&'a self, id: &'a ResourceId) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// Decode collaborator: turns raw bytes into a resource.
pub trait Decoder: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output>;
}

/// Fetches locators over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(options: &BoardOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(options.request_timeout);
        if let Some(ref agent) = options.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn get(&self, id: &ResourceId) -> Result<Vec<u8>> {
        debug!("Fetching: {id}");
        let response = self.client.get(id.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PhotoBoardError::Status {
                url: id.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(PhotoBoardError::EmptyPayload(id.to_string()));
        }
        debug!("{} bytes from {id}", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, id: &'a ResourceId) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.get(id).boxed()
    }
}

/// A decoded RGBA8 image. Clones share the pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

/// Decodes PNG and JPEG payloads into [`DecodedImage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    type Output = DecodedImage;

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            pixels: Arc::from(rgba.into_raw()),
        })
    }
}
