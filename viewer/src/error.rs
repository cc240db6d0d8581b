use ply::PlyError;
use splat_source::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to load splats: {0}")]
    Load(#[from] SourceError),

    #[error("Malformed point cloud: {0}")]
    Format(#[from] PlyError),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),
}
