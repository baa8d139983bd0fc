use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TechError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed rule file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule '{name}' = {value} is invalid: {reason}")]
    InvalidRule {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

pub type TechResult<T> = std::result::Result<T, TechError>;
