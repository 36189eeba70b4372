//! # Reporting
//!
//! The capture loop reports progress through a [`Reporter`] handed to it at construction rather
//! than writing to a global logger, so tests can observe what it says.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::Level;

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait Reporter {
    /// Report a message at the given level.
    fn report(&self, level: Level, msg: &str);

    fn info(&self, msg: &str) {
        self.report(Level::Info, msg)
    }

    fn debug(&self, msg: &str) {
        self.report(Level::Debug, msg)
    }

    fn warn(&self, msg: &str) {
        self.report(Level::Warn, msg)
    }
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Forwards reports to the `log` facade under the `cv_timelapse` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Reporter for LogReporter {
    fn report(&self, level: Level, msg: &str) {
        log::log!(target: "cv_timelapse", level, "{}", msg);
    }
}

impl<R: Reporter + ?Sized> Reporter for std::sync::Arc<R> {
    fn report(&self, level: Level, msg: &str) {
        (**self).report(level, msg)
    }
}
