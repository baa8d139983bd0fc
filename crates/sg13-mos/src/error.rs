use sg13_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosError {
    #[error("{device} {param} {value} is outside [{min}, {max}]")]
    OutOfRange {
        device: &'static str,
        param: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{device} {param} must be finite, got {value}")]
    NotFinite {
        device: &'static str,
        param: &'static str,
        value: f64,
    },

    #[error("contact run ({x1}, {y1}) -> ({x2}, {y2}) is not axis-aligned")]
    NonAxisAligned { x1: f64, y1: f64, x2: f64, y2: f64 },

    #[error("unknown {what} '{value}'")]
    UnknownName { what: &'static str, value: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MosError {
    /// Errors caused by the request itself rather than by the layer table.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, MosError::Core(_))
    }
}

pub type MosResult<T> = std::result::Result<T, MosError>;
