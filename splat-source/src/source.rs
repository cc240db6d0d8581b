use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::{Result, SourceError};

/// Where a splat cloud is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Source {
    Path { path: String },
    Url { url: String },
}

impl Source {
    /// Interprets `http://` and `https://` locations as URLs and everything else as a path.
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url { url: location.to_owned() }
        } else {
            Source::Path { path: location.to_owned() }
        }
    }

    /// Retrieves the whole resource as raw bytes.
    ///
    /// Errors only mean the bytes could not be fetched. What they contain is for the
    /// parser to judge.
    pub async fn load(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Source::Path { path } => tokio::fs::read(path).await?,
            Source::Url { url } => {
                let response = reqwest::get(url).await?;
                if !response.status().is_success() {
                    return Err(SourceError::Status(response.status()));
                }
                response.bytes().await?.to_vec()
            }
        };

        debug!(source = ?self, len = bytes.len(), "loaded splat source");
        Ok(bytes)
    }
}
