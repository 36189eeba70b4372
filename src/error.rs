//! # `cv_timelapse` Error module
//!
//! Provides abstractions over errors which can occur during this crate's use.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use thiserror;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Result type used by faillible functions inside the `cv_timelapse` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors which can occur during use of the `cv_timelapse` crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Wrong resolution format {0:?}, must be WIDTHxHEIGHT (e.g. 640x480)")]
    ResolutionFormatError(String),

    #[error("Cannot find file at {0:?}")]
    FileNotFound(PathBuf),

    #[error("Cannot create directory {path:?}: {source}")]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error
    },

    #[error("Cannot read directory {path:?}: {source}")]
    ReadDirError {
        path: PathBuf,
        source: std::io::Error
    },

    #[error("Cannot remove directory {path:?}: {source}")]
    RemoveDirError {
        path: PathBuf,
        source: std::io::Error
    },

    #[error("Cannot write frame to {path:?}: {source}")]
    FrameWriteError {
        path: PathBuf,
        source: std::io::Error
    },

    #[error("Cannot renumber frame {from:?} to {to:?}: {source}")]
    FrameRenameError {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error
    },

    #[error("Cannot open camera: {0}")]
    CameraOpenError(String),

    #[cfg(feature = "v4l2")]
    #[error("Cannot start camera stream: {0}")]
    CamStartError(rscam::Error),

    #[error("Unsupported image format {0:?}, only MJPG is supported")]
    ImageFormatError(String),

    #[error("Error capturing camera image: {0}")]
    CameraCaptureError(std::io::Error),

    #[error("Error occured while encoding an image: {0}")]
    ImageEncodeError(image::ImageError),

    #[error("Cannot start encoder {program:?}: {source}")]
    EncoderSpawnError {
        program: String,
        source: std::io::Error
    },

    #[error("Cannot install interrupt handler: {0}")]
    SignalHandlerError(ctrlc::Error)
}
