//! # `V4l2CameraBuilder` implementation
//!
//! This module implements the builder for V4L2 camera sessions.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use rscam::Config;

use crate::camera::V4l2Camera;
use crate::error::{Error, Result};
use crate::Resolution;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Builds a [`V4l2Camera`].
///
/// ```no_run
/// # use cv_timelapse::{V4l2CameraBuilder, Resolution};
/// let camera = V4l2CameraBuilder::new()
///     .path("/dev/video0")
///     .expect("Cannot find camera at specified path")
///     .resolution(Resolution::new(640, 480))
///     .format(b"MJPG")
///     .expect("Unsupported format")
///     .build()
///     .expect("Failed to open camera");
/// ```
pub struct V4l2CameraBuilder {
    path: Option<PathBuf>,

    config: Config<'static>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl V4l2CameraBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            config: Config {
                format: &b"MJPG"[..],
                ..Config::default()
            }
        }
    }

    /// Specify the path of the camera, i.e. the device path, such as `/dev/video1`
    ///
    /// # Returns
    /// - `self` if the path exists, `Err` otherwise
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        if path.as_ref().exists() {
            self.path = Some(path.as_ref().to_path_buf());

            Ok(self)
        } else {
            Err(Error::FileNotFound(path.as_ref().to_path_buf()))
        }
    }

    /// Set the interval of the camera.
    ///
    /// V4L2 uses intervals rather than framerates, default value is `(1, 10)`.
    pub fn interval(mut self, interval: (u32, u32)) -> Self {
        self.config.interval = interval;

        self
    }

    /// Set the resolution of the camera.
    ///
    /// Default value is `640x480`.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.config.resolution = resolution.as_tuple();

        self
    }

    /// Set the format of the images.
    ///
    /// Uses the FourCC notation. Frames are stored as they come off the camera so only `b"MJPG"`
    /// is accepted, which is also the default.
    pub fn format(mut self, format: &[u8]) -> Result<Self> {
        self.config.format = format_from_fourcc(format)
            .ok_or_else(|| Error::ImageFormatError(String::from_utf8_lossy(format).into_owned()))?;

        Ok(self)
    }

    /// Set the number of buffers in the queue for this camera.
    ///
    /// Default value is 2.
    pub fn num_buffers(mut self, num_buffers: u32) -> Self {
        self.config.nbuffers = num_buffers.max(1);

        self
    }

    /// Open the device and start streaming.
    ///
    /// This function can fail if the underlying V4L2 construction fails.
    pub fn build(self) -> Result<V4l2Camera> {
        let path = self.path
            .ok_or_else(|| Error::CameraOpenError(String::from("Missing camera path")))?;

        let device = path.to_str()
            .ok_or_else(|| Error::CameraOpenError(format!("Camera path {:?} is not UTF-8", path)))?;

        let camera = rscam::Camera::new(device)
            .map_err(|e| Error::CameraOpenError(format!("{}: {}", device, e)))?;

        V4l2Camera::start(camera, self.config)
    }
}

impl Default for V4l2CameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn format_from_fourcc(format: &[u8]) -> Option<&'static [u8]> {
    match format {
        b"MJPG" => Some(&b"MJPG"[..]),
        _ => None
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    /// Test that only MJPG is accepted as a format
    #[test]
    fn test_format() {
        assert!(V4l2CameraBuilder::new().format(b"MJPG").is_ok());

        match V4l2CameraBuilder::new().format(b"YUYV") {
            Err(Error::ImageFormatError(f)) => assert_eq!(f, "YUYV"),
            _ => panic!("YUYV should be rejected")
        }
    }

    /// Test that a missing device node is reported before anything is opened
    #[test]
    fn test_missing_path() {
        match V4l2CameraBuilder::new().path("/dev/does-not-exist-video") {
            Err(Error::FileNotFound(p)) => assert_eq!(p, Path::new("/dev/does-not-exist-video")),
            _ => panic!("missing path should be rejected")
        }
    }

    #[test]
    fn test_build_without_path() {
        match V4l2CameraBuilder::new().build() {
            Err(Error::CameraOpenError(_)) => (),
            _ => panic!("build without a path should fail")
        }
    }
}
