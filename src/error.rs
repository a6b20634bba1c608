use std::path::PathBuf;

/// Errors raised by the decoder, the terminal driver and the render loop.
#[derive(Debug, thiserror::Error)]
pub enum TerimError {
    #[error("cannot decode '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("unsupported terminal: {0}")]
    UnsupportedTerminal(String),

    #[error("terminal I/O failed: {0}")]
    TerminalIo(#[from] std::io::Error),

    #[error("resample failed: {0}")]
    Resample(String),

    #[error("quantization failed: {0}")]
    Quantize(#[from] imagequant::Error),
}

impl TerimError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TerimError>;
