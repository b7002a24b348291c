use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed OBJ/MTL text. `line` is 1-based.
    #[error("parse error on line {line}: {message} ('{text}')")]
    Parse {
        line: usize,
        text: String,
        message: String,
    },

    #[error("material '{name}' not found in MTL")]
    MaterialNotFound { name: String },

    #[error("failed to decode texture '{name}': {message}")]
    TextureDecode { name: String, message: String },

    #[error("OBJ contained no triangles")]
    Empty,
}

impl AssetError {
    pub(crate) fn parse(line_no: usize, text: &str, message: impl Into<String>) -> Self {
        AssetError::Parse {
            line: line_no + 1,
            text: text.to_owned(),
            message: message.into(),
        }
    }

    /// Errors the loader recovers from locally by falling back to the default texture.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AssetError::MaterialNotFound { .. } | AssetError::TextureDecode { .. }
        )
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
