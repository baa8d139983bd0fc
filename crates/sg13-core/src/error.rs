use thiserror::Error;

use crate::layer::LayerPurpose;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown layer {name}.{purpose}")]
    UnknownLayer { name: String, purpose: LayerPurpose },

    #[error("port '{0}' is already defined")]
    DuplicatePort(String),

    #[error("invalid grid: resolution {resolution}, epsilon {epsilon}")]
    InvalidGrid { resolution: f64, epsilon: f64 },
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
