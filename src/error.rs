use std::io;
use thiserror::Error;

/// Terminal outcome of a probe that produced no size.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("unrecognized file format")]
    Unrecognized,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProbeError {
    pub fn code(&self) -> &'static str {
        match self {
            ProbeError::Unrecognized => "ECONTENT",
            ProbeError::Io(_) => "EIO",
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ProbeError::Unrecognized)
    }
}
