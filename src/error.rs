use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image loading error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image too small for analysis (minimum: {0}x{0})")]
    ImageTooSmall(usize),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
