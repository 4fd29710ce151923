//! Error types for the change3d crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type. Every variant is fatal to a run; recoverable
/// conditions (degenerate confusion matrices, absent checkpoints) are handled
/// where they occur and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Checkpoint error ({}): {message}", path.display())]
    Checkpoint { path: PathBuf, message: String },

    #[error("Dataset error: {0}")]
    Dataset(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn checkpoint(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            message: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
