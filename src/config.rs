//! # Configuration
//!
//! Settings for a timelapse run: where to store, how often to capture, at which resolution, and
//! where the camera and encoder are found.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;
use std::time::Duration;

use crate::encoder::DEFAULT_ENCODER;
use crate::Resolution;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

pub const DEFAULT_DIRECTORY: &str = "data";
pub const DEFAULT_SECONDS: u64 = 15;
pub const DEFAULT_RESOLUTION: &str = "640x480";
pub const DEFAULT_DEVICE: &str = "/dev/video0";

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Storage root for day directories and movies
    pub directory: PathBuf,

    /// Delay between two captures, in seconds
    pub seconds: u64,

    pub resolution: Resolution,

    /// V4L2 device node
    pub device: PathBuf,

    /// Encoder program, looked up on `PATH`
    pub encoder: String
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Config {

    /// Delay between two captures.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            seconds: DEFAULT_SECONDS,
            resolution: Resolution::default(),
            device: PathBuf::from(DEFAULT_DEVICE),
            encoder: String::from(DEFAULT_ENCODER)
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
