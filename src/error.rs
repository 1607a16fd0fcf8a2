use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Everything that can end a conversion run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Error opening input file {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error decoding json: {0}")]
    Parse(#[source] serde_json::Error),

    /// A location entry lacks a required field or carries an unusable value.
    #[error("Malformed location record #{index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {bound} date format: {value:?} (expected yyyy/mm/dd)")]
    DateFormat {
        bound: &'static str,
        value: String,
        #[source]
        source: time::error::Parse,
    },

    #[error("Error creating output file {} for writing: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Input and output have to be different files ({})", .0.display())]
    SameInputOutput(PathBuf),

    #[error("No data found in json")]
    NoData,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Error writing output: {0}")]
    Write(#[from] io::Error),

    #[error("Error writing CSV output: {0}")]
    Csv(#[from] csv::Error),
}

impl ConvertError {
    /// Process exit status for this error; argument problems exit like clap usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Config(_) | ConvertError::SameInputOutput(_) => 2,
            _ => 1,
        }
    }
}
