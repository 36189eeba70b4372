//! # Resolution
//!
//! Parsing and display of camera resolutions in the `WIDTHxHEIGHT` form used on the command line.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::str::FromStr;

use derive_more::Display;

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Width and height of a captured frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "{}x{}", width, height)]
pub struct Resolution {
    pub width: u32,
    pub height: u32
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a resolution of the form `WIDTHxHEIGHT`.
    ///
    /// Whitespace around either number is ignored. Both numbers must be positive integers and
    /// there must be exactly one `x` separator, anything else is a
    /// [`Error::ResolutionFormatError`].
    pub fn parse(s: &str) -> Result<Self> {
        let err = || Error::ResolutionFormatError(s.to_string());

        let mut parts = s.split('x');
        let (width, height) = match (parts.next(), parts.next(), parts.next()) {
            (Some(w), Some(h), None) => (w, h),
            _ => return Err(err())
        };

        let width: u32 = width.trim().parse().map_err(|_| err())?;
        let height: u32 = height.trim().parse().map_err(|_| err())?;

        if width == 0 || height == 0 {
            return Err(err());
        }

        Ok(Self { width, height })
    }

    /// The resolution as a `(width, height)` tuple, as expected by V4L2.
    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
