//! # Timelapse capture loop
//!
//! Captures one frame every interval into the directory of the current day. When the date
//! changes, or a shutdown is requested, the day is finalized: its frames are encoded into a movie
//! and the day directory is removed.
//!
//! Each day moves through the same states:
//!
//! ```text
//! capturing --(date rolled over | shutdown)--> finalizing --> next day | stop
//! ```

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::camera::CaptureDevice;
use crate::clock::{Clock, SystemClock};
use crate::encoder::{EncodeStatus, Encoder};
use crate::error::{Error, Result};
use crate::layout::{compact_frames, ensure_dir, existing_frames, FrameSequence, StorageLayout};
use crate::report::{LogReporter, Reporter};
use crate::shutdown::Shutdown;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// What the loop should do after a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Keep capturing into the same day
    Continue,

    /// The calendar date moved past the day being captured
    DayRolledOver,

    /// A shutdown was requested
    Cancelled
}

/// What to do with a day's frames when the encoder fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePolicy {
    /// Leave the day directory in place so the frames can be encoded by hand
    KeepOnEncoderFailure,

    /// Remove the day directory whatever the encoder did
    DeleteAlways
}

/// Result of finalizing a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The movie was written and the frames removed
    Encoded {
        movie: PathBuf,
        frames: usize
    },

    /// The encoder failed or could not be run
    EncoderFailed {
        /// Whether the frames are still on disk
        frames_kept: bool
    },

    /// The day had no frames, its directory (if any) was removed without encoding
    Empty
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Summary of one captured day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub date: NaiveDate,

    /// Frames captured during this run of the day
    pub frames_captured: u64,

    /// Why capturing stopped
    pub stopped_by: CaptureOutcome,

    pub finalize: FinalizeOutcome
}

/// The capture loop, owning the camera session for its lifetime.
pub struct Timelapse<C, E> {
    camera: C,
    encoder: E,
    layout: StorageLayout,
    interval: Duration,
    shutdown: Shutdown,
    clock: Box<dyn Clock>,
    reporter: Box<dyn Reporter>,
    frame_policy: FramePolicy
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl<C: CaptureDevice, E: Encoder> Timelapse<C, E> {

    /// Create a new capture loop using the system clock and reporting through `log`.
    pub fn new(
        camera: C,
        encoder: E,
        layout: StorageLayout,
        interval: Duration,
        shutdown: Shutdown
    ) -> Self {
        Self {
            camera,
            encoder,
            layout,
            interval,
            shutdown,
            clock: Box::new(SystemClock),
            reporter: Box::new(LogReporter),
            frame_policy: FramePolicy::KeepOnEncoderFailure
        }
    }

    pub fn with_clock<K: Clock + 'static>(mut self, clock: K) -> Self {
        self.clock = Box::new(clock);

        self
    }

    pub fn with_reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);

        self
    }

    pub fn with_frame_policy(mut self, policy: FramePolicy) -> Self {
        self.frame_policy = policy;

        self
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Capture day after day until a shutdown is requested.
    ///
    /// `on_day` is handed the report of each day as soon as it has been finalized. A shutdown is
    /// a normal stop and returns `Ok` with the number of days captured. Errors from the camera or
    /// filesystem stop the loop, after the current day has been finalized.
    pub fn run<F: FnMut(&DayReport)>(&mut self, mut on_day: F) -> Result<usize> {
        self.layout.ensure_root()?;

        let mut days = 0;
        loop {
            let report = self.run_day()?;
            days += 1;
            on_day(&report);

            if report.stopped_by == CaptureOutcome::Cancelled {
                self.reporter.info("Exiting.");
                return Ok(days);
            }
        }
    }

    /// Capture into today's directory until the date changes or a shutdown is requested, then
    /// finalize the day.
    ///
    /// The day is finalized however capturing ends, including on a capture error, which is
    /// returned once finalizing is done.
    pub fn run_day(&mut self) -> Result<DayReport> {
        let today = self.clock.today();
        self.reporter.info(&format!("Capturing {}", today.format("%a %b %e %Y")));

        let day_dir = self.layout.day_dir(today);
        ensure_dir(&day_dir)?;

        let mut frames = FrameSequence::resume(&day_dir)?;
        if frames.next_index() > 0 {
            self.reporter.info(&format!(
                "Resuming {} after {} existing frames", day_dir.display(), frames.next_index()
            ));
        }

        let first_index = frames.next_index();
        let stopped = loop {
            match self.capture_step(today, &mut frames) {
                Ok(CaptureOutcome::Continue) => (),
                other => break other
            }
        };

        match stopped {
            Ok(CaptureOutcome::DayRolledOver) => self.reporter.info("End of the day"),
            Ok(CaptureOutcome::Cancelled) => self.reporter.info("Exiting... but cleaning first"),
            Ok(CaptureOutcome::Continue) => (),
            Err(ref e) => self.reporter.warn(&format!("Capture failed: {}", e))
        }

        let finalize = self.finalize_day(today);

        let stopped_by = match stopped {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(ref fe) = finalize {
                    self.reporter.warn(&format!("Finalizing {} also failed: {}", today, fe));
                }
                return Err(e);
            }
        };

        Ok(DayReport {
            date: today,
            frames_captured: u64::from(frames.next_index() - first_index),
            stopped_by,
            finalize: finalize?
        })
    }

    /// Take one capture step: capture a frame, wait out the interval, then check for rollover.
    ///
    /// A shutdown requested before the capture or during the wait ends the step early.
    pub fn capture_step(
        &mut self,
        day: NaiveDate,
        frames: &mut FrameSequence
    ) -> Result<CaptureOutcome> {
        if self.shutdown.is_triggered() {
            return Ok(CaptureOutcome::Cancelled);
        }

        let path = frames.next_path();
        self.camera.capture_to(&path)?;
        self.reporter.debug(&format!("\tCaptured {}", path.display()));

        if self.shutdown.sleep(self.interval) {
            return Ok(CaptureOutcome::Cancelled);
        }

        if self.clock.today() > day {
            return Ok(CaptureOutcome::DayRolledOver);
        }

        Ok(CaptureOutcome::Continue)
    }

    /// Encode the frames of `date` into a movie and remove the day directory.
    ///
    /// Frames are renumbered first if their indices have gaps, so every one of them reaches the
    /// movie. The encoder is always awaited before anything is removed. If it fails, the frames are
    /// kept or removed according to the [`FramePolicy`].
    pub fn finalize_day(&mut self, date: NaiveDate) -> Result<FinalizeOutcome> {
        let day_dir = self.layout.day_dir(date);
        let frames = existing_frames(&day_dir)?;

        if frames.is_empty() {
            self.reporter.info(&format!("No frames for {}, nothing to encode", date));
            remove_day_dir(&day_dir)?;
            return Ok(FinalizeOutcome::Empty);
        }

        // The encoder stops at the first missing index
        let renumbered = compact_frames(&day_dir)?;
        if renumbered > 0 {
            self.reporter.info(&format!(
                "Renumbered {} frames in {} to close gaps", renumbered, day_dir.display()
            ));
        }

        self.reporter.info("Making movie");
        let movie = self.layout.free_movie_path(date);
        let pattern = self.layout.frame_pattern(date);

        let failure = match self.encoder.encode(&pattern, &movie) {
            Ok(EncodeStatus::Success) => None,
            Ok(EncodeStatus::Failed(Some(code))) => Some(format!("exited with status {}", code)),
            Ok(EncodeStatus::Failed(None)) => Some(String::from("was killed by a signal")),
            Err(e) => Some(format!("could not be run: {}", e))
        };

        match failure {
            None => {
                remove_day_dir(&day_dir)?;
                self.reporter.info(&format!("Wrote {}", movie.display()));

                Ok(FinalizeOutcome::Encoded {
                    movie,
                    frames: frames.len()
                })
            },
            Some(reason) => {
                let frames_kept = self.frame_policy == FramePolicy::KeepOnEncoderFailure;
                if frames_kept {
                    self.reporter.warn(&format!(
                        "Encoder {}, keeping {} frames in {}",
                        reason, frames.len(), day_dir.display()
                    ));
                } else {
                    self.reporter.warn(&format!(
                        "Encoder {}, deleting {} frames anyway", reason, frames.len()
                    ));
                    remove_day_dir(&day_dir)?;
                }

                Ok(FinalizeOutcome::EncoderFailed { frames_kept })
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Remove a day directory and everything in it, a missing directory is not an error.
fn remove_day_dir(dir: &std::path::Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::RemoveDirError {
            path: dir.to_path_buf(),
            source
        })
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use std::cell::Cell;
    use std::path::Path;
    use std::rc::Rc;

    use crate::camera::SimulatedCamera;
    use crate::clock::ManualClock;
    use crate::layout::frame_name;
    use crate::Resolution;

    /// Encoder double which checks its input is present and numbered without gaps, then writes a
    /// placeholder movie.
    struct FakeEncoder {
        status: EncodeStatus,
        calls: Rc<Cell<usize>>,
        frames_seen: Rc<Cell<usize>>
    }

    impl Encoder for FakeEncoder {
        fn encode(&self, pattern: &Path, output: &Path) -> Result<EncodeStatus> {
            self.calls.set(self.calls.get() + 1);

            let dir = pattern.parent().unwrap();
            assert!(dir.join(frame_name(0)).exists(), "frames removed before encoding");
            assert_eq!(pattern.file_name().unwrap(), "img%05d.jpg");

            let frames = existing_frames(dir).unwrap();
            for (slot, &(index, _)) in frames.iter().enumerate() {
                assert_eq!(index as usize, slot, "frame numbering has a gap");
            }
            self.frames_seen.set(frames.len());

            if self.status == EncodeStatus::Success {
                fs::write(output, b"movie").unwrap();
            }

            Ok(self.status)
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, 14).unwrap()
    }

    fn timelapse(
        root: &Path,
        status: EncodeStatus
    ) -> (Timelapse<SimulatedCamera, FakeEncoder>, ManualClock, Shutdown, Rc<Cell<usize>>) {
        let clock = ManualClock::new(day());
        let shutdown = Shutdown::new();
        let calls = Rc::new(Cell::new(0));

        let tl = Timelapse::new(
            SimulatedCamera::new(Resolution::new(16, 12)),
            FakeEncoder { status, calls: calls.clone(), frames_seen: Rc::default() },
            StorageLayout::new(root),
            Duration::from_secs(0),
            shutdown.clone()
        ).with_clock(clock.clone());

        (tl, clock, shutdown, calls)
    }

    /// Test the three outcomes of a capture step
    #[test]
    fn test_capture_step_outcomes() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tl, clock, shutdown, _) = timelapse(tmp.path(), EncodeStatus::Success);
        let day_dir = tl.layout().day_dir(day());
        ensure_dir(&day_dir).unwrap();
        let mut frames = FrameSequence::resume(&day_dir).unwrap();

        assert_eq!(tl.capture_step(day(), &mut frames).unwrap(), CaptureOutcome::Continue);
        assert!(day_dir.join("img00000.jpg").exists());

        clock.advance_day();
        assert_eq!(tl.capture_step(day(), &mut frames).unwrap(), CaptureOutcome::DayRolledOver);
        assert!(day_dir.join("img00001.jpg").exists());

        shutdown.trigger();
        assert_eq!(tl.capture_step(day(), &mut frames).unwrap(), CaptureOutcome::Cancelled);
        assert!(!day_dir.join("img00002.jpg").exists());
        assert_eq!(tl.camera().frames_captured(), 2);
    }

    /// Test a successful finalize writes the movie and removes the frames
    #[test]
    fn test_finalize_success() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tl, _, _, calls) = timelapse(tmp.path(), EncodeStatus::Success);
        let day_dir = tl.layout().day_dir(day());
        ensure_dir(&day_dir).unwrap();
        for i in 0..3 {
            fs::write(day_dir.join(frame_name(i)), b"jpg").unwrap();
        }

        let outcome = tl.finalize_day(day()).unwrap();

        assert_eq!(outcome, FinalizeOutcome::Encoded {
            movie: tmp.path().join("2021-03-14.mp4"),
            frames: 3
        });
        assert!(!day_dir.exists());
        assert!(tmp.path().join("2021-03-14.mp4").exists());
        assert_eq!(calls.get(), 1);
    }

    /// Test frames left with holes in their numbering all reach the encoder
    #[test]
    fn test_finalize_gapped_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Rc::new(Cell::new(0));
        let frames_seen = Rc::new(Cell::new(0));
        let mut tl = Timelapse::new(
            SimulatedCamera::new(Resolution::new(8, 8)),
            FakeEncoder {
                status: EncodeStatus::Success,
                calls: calls.clone(),
                frames_seen: frames_seen.clone()
            },
            StorageLayout::new(tmp.path()),
            Duration::from_secs(0),
            Shutdown::new()
        ).with_clock(ManualClock::new(day()));

        let day_dir = tl.layout().day_dir(day());
        ensure_dir(&day_dir).unwrap();
        for i in &[0, 1, 7] {
            fs::write(day_dir.join(frame_name(*i)), b"jpg").unwrap();
        }

        let outcome = tl.finalize_day(day()).unwrap();

        assert_eq!(outcome, FinalizeOutcome::Encoded {
            movie: tmp.path().join("2021-03-14.mp4"),
            frames: 3
        });
        assert_eq!(frames_seen.get(), 3);
        assert_eq!(calls.get(), 1);
        assert!(!day_dir.exists());
    }

    /// Test the default policy keeps frames the encoder failed on
    #[test]
    fn test_finalize_failure_keeps_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tl, _, _, _) = timelapse(tmp.path(), EncodeStatus::Failed(Some(1)));
        let day_dir = tl.layout().day_dir(day());
        ensure_dir(&day_dir).unwrap();
        fs::write(day_dir.join(frame_name(0)), b"jpg").unwrap();

        let outcome = tl.finalize_day(day()).unwrap();

        assert_eq!(outcome, FinalizeOutcome::EncoderFailed { frames_kept: true });
        assert!(day_dir.join(frame_name(0)).exists());
    }

    /// Test the delete always policy removes frames even when the encoder failed
    #[test]
    fn test_finalize_failure_delete_always() {
        let tmp = tempfile::tempdir().unwrap();
        let (tl, _, _, _) = timelapse(tmp.path(), EncodeStatus::Failed(None));
        let mut tl = tl.with_frame_policy(FramePolicy::DeleteAlways);
        let day_dir = tl.layout().day_dir(day());
        ensure_dir(&day_dir).unwrap();
        fs::write(day_dir.join(frame_name(0)), b"jpg").unwrap();

        let outcome = tl.finalize_day(day()).unwrap();

        assert_eq!(outcome, FinalizeOutcome::EncoderFailed { frames_kept: false });
        assert!(!day_dir.exists());
    }

    /// Test an empty or missing day is cleaned up without running the encoder
    #[test]
    fn test_finalize_empty_day() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tl, _, _, calls) = timelapse(tmp.path(), EncodeStatus::Success);
        let day_dir = tl.layout().day_dir(day());

        assert_eq!(tl.finalize_day(day()).unwrap(), FinalizeOutcome::Empty);

        ensure_dir(&day_dir).unwrap();
        assert_eq!(tl.finalize_day(day()).unwrap(), FinalizeOutcome::Empty);
        assert!(!day_dir.exists());
        assert_eq!(calls.get(), 0);
    }

    /// Test a second movie for the same day does not overwrite the first
    #[test]
    fn test_finalize_does_not_clobber() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tl, _, _, _) = timelapse(tmp.path(), EncodeStatus::Success);
        fs::write(tmp.path().join("2021-03-14.mp4"), b"earlier").unwrap();
        let day_dir = tl.layout().day_dir(day());
        ensure_dir(&day_dir).unwrap();
        fs::write(day_dir.join(frame_name(0)), b"jpg").unwrap();

        match tl.finalize_day(day()).unwrap() {
            FinalizeOutcome::Encoded { movie, .. } => {
                assert_eq!(movie, tmp.path().join("2021-03-14-1.mp4"))
            },
            other => panic!("unexpected {:?}", other)
        }
        assert_eq!(fs::read(tmp.path().join("2021-03-14.mp4")).unwrap(), b"earlier");
    }

    /// Test a day rollover ends the day and finalizes it exactly once
    #[test]
    fn test_run_day_rollover() {
        struct RollingCamera {
            inner: SimulatedCamera,
            clock: ManualClock,
            roll_after: u64
        }

        impl CaptureDevice for RollingCamera {
            fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
                self.inner.set_resolution(resolution)
            }

            fn capture_to(&mut self, path: &Path) -> Result<()> {
                self.inner.capture_to(path)?;
                if self.inner.frames_captured() == self.roll_after {
                    self.clock.advance_day();
                }
                Ok(())
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let clock = ManualClock::new(day());
        let calls = Rc::new(Cell::new(0));
        let mut tl = Timelapse::new(
            RollingCamera {
                inner: SimulatedCamera::new(Resolution::new(8, 8)),
                clock: clock.clone(),
                roll_after: 4
            },
            FakeEncoder {
                status: EncodeStatus::Success,
                calls: calls.clone(),
                frames_seen: Rc::default()
            },
            StorageLayout::new(tmp.path()),
            Duration::from_secs(0),
            Shutdown::new()
        ).with_clock(clock);

        let report = tl.run_day().unwrap();

        assert_eq!(report.date, day());
        assert_eq!(report.frames_captured, 4);
        assert_eq!(report.stopped_by, CaptureOutcome::DayRolledOver);
        assert_eq!(calls.get(), 1);
        assert!(!tmp.path().join("2021-03-14").exists());
    }

    /// Test a failing camera still gets its day finalized before the error is returned
    #[test]
    fn test_run_day_capture_error() {
        struct FailingCamera {
            inner: SimulatedCamera
        }

        impl CaptureDevice for FailingCamera {
            fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
                self.inner.set_resolution(resolution)
            }

            fn capture_to(&mut self, path: &Path) -> Result<()> {
                if self.inner.frames_captured() == 2 {
                    return Err(Error::CameraCaptureError(
                        std::io::Error::new(ErrorKind::Other, "unplugged")
                    ));
                }
                self.inner.capture_to(path)
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let calls = Rc::new(Cell::new(0));
        let mut tl = Timelapse::new(
            FailingCamera { inner: SimulatedCamera::new(Resolution::new(8, 8)) },
            FakeEncoder {
                status: EncodeStatus::Success,
                calls: calls.clone(),
                frames_seen: Rc::default()
            },
            StorageLayout::new(tmp.path()),
            Duration::from_secs(0),
            Shutdown::new()
        ).with_clock(ManualClock::new(day()));

        match tl.run_day() {
            Err(Error::CameraCaptureError(_)) => (),
            other => panic!("unexpected {:?}", other)
        }
        assert_eq!(calls.get(), 1);
        assert!(tmp.path().join("2021-03-14.mp4").exists());
        assert!(!tmp.path().join("2021-03-14").exists());
    }
}
