use thiserror::Error;

/// Main error type for the Screenframer library
#[derive(Error, Debug)]
pub enum FramerError {
    #[error("Frame image error: {0}")]
    Frame(#[from] FrameError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Frame-artwork errors (loading and decoding device frame images)
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to load frame image: {path}")]
    LoadFailed { path: String },

    #[error("Frame image has no alpha channel: {path}")]
    NoAlphaChannel { path: String },

    #[error("Unknown frame preset: {id}")]
    UnknownPreset { id: String },
}

/// Export pipeline errors
///
/// Every variant is terminal for the export attempt; nothing is retried
/// automatically. Partial output files are removed before the error is
/// returned to the caller.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Source video is not readable: {path}")]
    AssetUnreadable { path: String },

    #[error("Source contains no video track: {path}")]
    NoVideoTrack { path: String },

    #[error("Invalid trim range: {details}")]
    InvalidTrimRange { details: String },

    #[error("Failed to create export session: {reason}")]
    SessionFailed { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Export was cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using FramerError
pub type Result<T> = std::result::Result<T, FramerError>;

impl FramerError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Frame(FrameError::LoadFailed { path }) => {
                format!("Could not load frame image '{}'. Please check the file exists and is a PNG with an alpha channel.", path)
            }
            Self::Export(ExportError::AssetUnreadable { path }) => {
                format!("Could not open video '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Export(ExportError::NoVideoTrack { path }) => {
                format!("'{}' contains no video track.", path)
            }
            Self::Export(ExportError::InvalidTrimRange { details }) => {
                format!("The trim range is invalid: {}. Adjust the start/end times and export again.", details)
            }
            Self::Export(ExportError::SessionFailed { reason }) => {
                format!("Export could not start: {}. Is ffmpeg installed and on PATH?", reason)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
