//! Error types for fbcount-core

/// Error types for the fbcount pipeline core
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("whitelist error: {0}")]
    Whitelist(String),

    #[error("FASTQ parsing error: {0}")]
    FastqParse(String),

    #[error("FASTA parsing error: {0}")]
    FastaParse(String),

    #[error("barcode correction error: {0}")]
    Barcode(String),

    #[error("UMI error: {0}")]
    Umi(String),

    #[error("saturation estimation error: {0}")]
    Saturation(String),

    #[error("feature aggregation error: {0}")]
    Feature(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
