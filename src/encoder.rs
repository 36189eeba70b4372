//! # Movie encoder
//!
//! Turns a day's numbered frames into a single movie by running an external image sequence
//! transcoder (`ffmpeg` or `avconv`) as a child process.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

pub const DEFAULT_ENCODER: &str = "ffmpeg";

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait Encoder {
    /// Encode the frames matching `pattern` into `output`, blocking until done.
    ///
    /// `Err` means the encoder could not be run at all, an encoder which ran and failed is
    /// reported through [`EncodeStatus::Failed`].
    fn encode(&self, pattern: &Path, output: &Path) -> Result<EncodeStatus>;
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStatus {
    Success,

    /// The encoder exited unsuccessfully, with its exit code if it had one.
    Failed(Option<i32>)
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Runs `<program> -f image2 -i <pattern> <output>`.
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    program: OsString
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CommandEncoder {
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into()
        }
    }

    pub fn program(&self) -> &std::ffi::OsStr {
        &self.program
    }

    /// The command which would encode `pattern` into `output`.
    pub fn command(&self, pattern: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-f")
            .arg("image2")
            .arg("-i")
            .arg(pattern)
            .arg(output)
            // Nothing to answer an overwrite prompt with
            .stdin(Stdio::null());
        cmd
    }
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODER)
    }
}

impl Encoder for CommandEncoder {
    fn encode(&self, pattern: &Path, output: &Path) -> Result<EncodeStatus> {
        let status = self.command(pattern, output)
            .status()
            .map_err(|e| Error::EncoderSpawnError {
                program: self.program.to_string_lossy().into_owned(),
                source: e
            })?;

        Ok(EncodeStatus::from(status))
    }
}

impl From<ExitStatus> for EncodeStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            EncodeStatus::Success
        } else {
            EncodeStatus::Failed(status.code())
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
