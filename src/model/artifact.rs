use std::path::Path;

use async_trait::async_trait;
use log::info;

use crate::error::FetchError;

/// Where artifact bytes come from.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP GET, whole body buffered in memory.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response.bytes().await.map_err(network)?;
        Ok(body.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Present,
    Downloaded { bytes: usize },
}

/// Make sure `dest` exists, downloading it from `url` if it does not.
///
/// An existing file is trusted as-is: there is no integrity check and no
/// network call. A crash mid-write can leave a truncated file behind.
pub async fn ensure(
    source: &dyn ArtifactSource,
    url: &str,
    dest: &Path,
) -> Result<EnsureOutcome, FetchError> {
    if tokio::fs::try_exists(dest).await? {
        info!("Model artifact already present at {}", dest.display());
        return Ok(EnsureOutcome::Present);
    }

    info!("Downloading model artifact from {url}");
    let data = source.fetch(url).await?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &data).await?;

    info!("Wrote {} bytes to {}", data.len(), dest.display());
    Ok(EnsureOutcome::Downloaded { bytes: data.len() })
}
