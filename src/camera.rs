//! # Camera Module
//!
//! This module provides the capture devices the timelapse loop drives. Every device offers the
//! same capability, writing the next frame as a JPEG file at a given path, whether it is backed
//! by a V4L2 camera or synthesised in memory.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::{Error, Result};
use crate::Resolution;

#[cfg(feature = "v4l2")]
use rscam::{Camera, Config};

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait CaptureDevice {
    /// Change the resolution frames are captured at.
    fn set_resolution(&mut self, resolution: Resolution) -> Result<()>;

    /// Capture a frame from the device and write it to `path` as a JPEG.
    fn capture_to(&mut self, path: &Path) -> Result<()>;
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTS
// -----------------------------------------------------------------------------------------------

/// A V4L2 camera streaming MJPG, built with [`crate::V4l2CameraBuilder`].
///
/// The stream is stopped when the camera is dropped.
#[cfg(feature = "v4l2")]
pub struct V4l2Camera {
    camera: Camera,

    config: Config<'static>,

    streaming: bool
}

/// A camera which needs no hardware, each frame is a generated gradient image.
///
/// The image changes from frame to frame so consecutive frames are distinguishable.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    resolution: Resolution,

    frames_captured: u64
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "v4l2")]
impl V4l2Camera {

    /// Wrap an opened camera and start streaming with `config`.
    pub(crate) fn start(mut camera: Camera, config: Config<'static>) -> Result<Self> {
        camera.start(&config).map_err(|e| Error::CamStartError(e))?;

        log::debug!(
            "Camera streaming at {}x{}, {} buffers",
            config.resolution.0,
            config.resolution.1,
            config.nbuffers
        );

        Ok(Self {
            camera,
            config,
            streaming: true
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.config.resolution.0, self.config.resolution.1)
    }
}

#[cfg(feature = "v4l2")]
impl CaptureDevice for V4l2Camera {

    /// Restart the stream at the new resolution.
    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        if self.streaming && self.config.resolution == resolution.as_tuple() {
            return Ok(());
        }

        if self.streaming {
            self.camera.stop().map_err(|e| Error::CameraCaptureError(e))?;
            self.streaming = false;
        }

        self.config.resolution = resolution.as_tuple();
        self.camera.start(&self.config).map_err(|e| Error::CamStartError(e))?;
        self.streaming = true;

        Ok(())
    }

    fn capture_to(&mut self, path: &Path) -> Result<()> {
        let camera = &self.camera;
        let frame = capture_fresh(self.config.nbuffers, || {
            camera.capture().map_err(|e| Error::CameraCaptureError(e))
        })?;

        // MJPG buffers are complete JPEG images
        fs::write(path, &frame[..])
            .map_err(|e| Error::FrameWriteError { path: path.to_path_buf(), source: e })
    }
}

#[cfg(feature = "v4l2")]
impl Drop for V4l2Camera {
    fn drop(&mut self) {
        if self.streaming {
            if let Err(e) = self.camera.stop() {
                log::warn!("Failed to stop camera stream: {}", e);
            }
        }
    }
}

impl SimulatedCamera {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            frames_captured: 0
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of frames written so far.
    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    fn render(&self) -> RgbImage {
        let Resolution { width, height } = self.resolution;
        let shift = (self.frames_captured % 256) as u32;

        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 255 / width.max(1) + shift) % 256) as u8,
                ((y * 255 / height.max(1)) % 256) as u8,
                shift as u8
            ])
        })
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(Resolution::default())
    }
}

impl CaptureDevice for SimulatedCamera {
    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        self.resolution = resolution;

        Ok(())
    }

    fn capture_to(&mut self, path: &Path) -> Result<()> {
        DynamicImage::ImageRgb8(self.render())
            .save_with_format(path, ImageFormat::Jpeg)
            .map_err(|e| match e {
                image::ImageError::IoError(source) => Error::FrameWriteError {
                    path: path.to_path_buf(),
                    source
                },
                e => Error::ImageEncodeError(e)
            })?;

        self.frames_captured += 1;

        Ok(())
    }
}

impl<C: CaptureDevice + ?Sized> CaptureDevice for Box<C> {
    fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        (**self).set_resolution(resolution)
    }

    fn capture_to(&mut self, path: &Path) -> Result<()> {
        (**self).capture_to(path)
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Capture a frame taken after this call, discarding the `queued` buffers which may have filled
/// since the last capture.
///
/// Each stale frame is dropped, and so handed back to the driver, before the next is dequeued.
#[cfg_attr(not(feature = "v4l2"), allow(dead_code))]
fn capture_fresh<F, T>(queued: u32, mut capture: F) -> Result<T>
where
    F: FnMut() -> Result<T>
{
    for _ in 0..queued {
        drop(capture()?);
    }

    capture()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
