pub type InknoteResult<T> = Result<T, InknoteError>;

#[derive(thiserror::Error, Debug)]
pub enum InknoteError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InknoteError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}
