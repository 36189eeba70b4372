//! # Timelapse capture for the CV system
//!
//! This crate captures a still image from a camera at a fixed interval, stores the images in one
//! directory per day, and at the end of each day (or on shutdown) compiles the day's images into
//! a single movie with an external encoder before deleting them.
//!
//! Under the hood this uses [`rscam`](https://github.com/loyd/rscam) to access cameras over V4L2,
//! therefore currently only Linux is supported for real hardware. A [`SimulatedCamera`] is
//! available everywhere.
//!
//! ## Dependencies
//!
//! - V4L2 - video for linux 2, a camera able to stream MJPG
//! - `ffmpeg` or `avconv` on the `PATH`
//!
//! ### Ubuntu
//!
//! ```shell
//! sudo apt install v4l-utils ffmpeg
//! ```
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── 2020-07-03.mp4
//! └── 2020-07-04/
//!     ├── img00000.jpg
//!     └── img00001.jpg
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use cv_timelapse::prelude::*;
//!
//! let camera = SimulatedCamera::new(Resolution::new(640, 480));
//! let mut timelapse = Timelapse::new(
//!     camera,
//!     CommandEncoder::default(),
//!     StorageLayout::new("data"),
//!     Duration::from_secs(15),
//!     Shutdown::from_ctrlc().expect("Cannot install interrupt handler")
//! );
//!
//! // Runs until interrupted
//! timelapse
//!     .run(|day| println!("{}: {:?}", day.date, day.finalize))
//!     .expect("Capture failed");
//! ```

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "v4l2")]
pub use builder::V4l2CameraBuilder;
#[cfg(feature = "v4l2")]
pub use camera::V4l2Camera;
pub use camera::{CaptureDevice, SimulatedCamera};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use encoder::{CommandEncoder, EncodeStatus, Encoder};
pub use error::{Error, Result};
pub use layout::{FrameSequence, StorageLayout};
pub use report::{LogReporter, Reporter};
pub use resolution::Resolution;
pub use shutdown::Shutdown;
pub use timelapse::{CaptureOutcome, DayReport, FinalizeOutcome, FramePolicy, Timelapse};

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

#[cfg(feature = "v4l2")]
mod builder;
mod camera;
mod clock;
pub mod config;
pub mod encoder;
mod error;
pub mod layout;
mod report;
mod resolution;
mod shutdown;
mod timelapse;

pub mod prelude {
    pub use crate::{CaptureDevice, SimulatedCamera, Resolution};
    pub use crate::{CommandEncoder, Encoder, StorageLayout, Shutdown, Timelapse};
    #[cfg(feature = "v4l2")]
    pub use crate::V4l2CameraBuilder;
}
