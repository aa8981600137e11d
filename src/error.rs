use thiserror::Error;

pub type WaveResult<T> = Result<T, WaveError>;

#[derive(Debug, Error)]
pub enum WaveError {
    #[error("column not found: `{column}`")]
    ColumnNotFound { column: String },

    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("layer not found: `{0}`")]
    LayerNotFound(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The drawing root went away or refused a mutation. Never contained.
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("schema error: {0}")]
    Schema(#[from] serde_json::Error),
}

impl WaveError {
    /// Backend integrity failures propagate to the caller; everything else is
    /// contained at the layer boundary.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
