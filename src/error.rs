use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("Failed to load image {source_name}: {source}")]
    ImageLoad {
        source_name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode composited image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
