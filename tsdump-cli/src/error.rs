use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream error: {0}")]
    Stream(#[from] ts_demux::TsError),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}
