use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudBandError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Misaligned sequence: {timestamps} timestamps for {snapshots} field snapshots")]
    MisalignedSequence { timestamps: usize, snapshots: usize },

    #[error("Invalid time axis: {0}")]
    InvalidTimeAxis(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unsupported detection period: {hours} h (expected 1, 3, 6, 12 or 24)")]
    InvalidPeriod { hours: u32 },

    #[error("Corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    #[error("Domain '{domain}', timestep {index} ({date}), stage '{stage}': {source}")]
    Timestep {
        domain: String,
        index: usize,
        date: chrono::NaiveDateTime,
        stage: crate::progress::Stage,
        #[source]
        source: Box<CloudBandError>,
    },

    #[error("Invalid parameters: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudBandError>;
