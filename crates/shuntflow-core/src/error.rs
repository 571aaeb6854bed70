use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShuntError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Unsupported color layout: {0}")]
    UnsupportedColorLayout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Session is {0}; reset it before processing more frames")]
    SessionClosed(String),

    #[error("Frame task failed: {0}")]
    FrameTask(String),
}

pub type Result<T> = std::result::Result<T, ShuntError>;
