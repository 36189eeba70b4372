//! # Storage layout
//!
//! Where frames and movies live under the storage root:
//!
//! ```text
//! <root>/<YYYY-MM-DD>/img00000.jpg   frames of the active day
//! <root>/<YYYY-MM-DD>.mp4            one movie per finalized day
//! ```

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const FRAME_PREFIX: &str = "img";
const FRAME_EXT: &str = ".jpg";
const MOVIE_EXT: &str = "mp4";

/// `printf` style pattern matching every frame file of a day, as understood by the encoder.
pub const FRAME_PATTERN: &str = "img%05d.jpg";

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf
}

/// Hands out sequential frame paths inside a single day directory.
#[derive(Debug)]
pub struct FrameSequence {
    dir: PathBuf,
    next: u32
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StorageLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        ensure_dir(&self.root)
    }

    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(day_name(date))
    }

    /// The encoder input pattern for the frames of `date`.
    pub fn frame_pattern(&self, date: NaiveDate) -> PathBuf {
        self.day_dir(date).join(FRAME_PATTERN)
    }

    /// The canonical movie path for `date`, `<root>/<date>.mp4`.
    pub fn movie_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{}.{}", day_name(date), MOVIE_EXT))
    }

    /// The first movie path for `date` which does not exist yet.
    ///
    /// Falls back to `<date>-1.mp4`, `<date>-2.mp4`, ... when the day has already been finalized
    /// once, for example after a restart on the same day.
    pub fn free_movie_path(&self, date: NaiveDate) -> PathBuf {
        let path = self.movie_path(date);
        if !path.exists() {
            return path;
        }

        (1u32..)
            .map(|n| self.root.join(format!("{}-{}.{}", day_name(date), n, MOVIE_EXT)))
            .find(|p| !p.exists())
            .unwrap_or(path)
    }
}

impl FrameSequence {
    /// Start a sequence in `dir`, continuing after any frames already there.
    ///
    /// A fresh directory starts at index 0.
    pub fn resume<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let next = existing_frames(&dir)?
            .last()
            .map(|&(i, _)| i + 1)
            .unwrap_or(0);

        Ok(Self { dir, next })
    }

    /// Index the next frame will be written with.
    pub fn next_index(&self) -> u32 {
        self.next
    }

    /// Take the next frame path, advancing the counter.
    pub fn next_path(&mut self) -> PathBuf {
        let path = self.dir.join(frame_name(self.next));
        self.next += 1;
        path
    }
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Create `path` and its parents, an existing directory is not an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(Error::CreateDirError {
            path: path.to_path_buf(),
            source
        })
    }
}

/// File name of the frame with the given index, `img00042.jpg`.
pub fn frame_name(index: u32) -> String {
    format!("{}{:05}{}", FRAME_PREFIX, index, FRAME_EXT)
}

/// Parse a frame index back out of a file name.
pub fn parse_frame_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(FRAME_PREFIX)?.strip_suffix(FRAME_EXT)?;

    if digits.len() < 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

/// Frames in `dir` sorted by index, a missing directory has none.
pub fn existing_frames(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let read_err = |source| Error::ReadDirError {
        path: dir.to_path_buf(),
        source
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e))
    };

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(read_err)?;
        if let Some(index) = entry.file_name().to_str().and_then(parse_frame_name) {
            frames.push((index, entry.path()));
        }
    }
    frames.sort_by_key(|&(i, _)| i);

    Ok(frames)
}

/// Renumber the frames in `dir` so they run from 0 without gaps, keeping their order.
///
/// The encoder reads frames in sequence and stops at the first missing index, so a day with
/// holes in its numbering is closed up before encoding. Returns how many frames were renamed.
pub fn compact_frames(dir: &Path) -> Result<usize> {
    let mut renamed = 0;

    // Indices only ever move down into slots already vacated
    for (slot, (index, from)) in existing_frames(dir)?.into_iter().enumerate() {
        if index as usize == slot {
            continue;
        }

        let to = dir.join(frame_name(slot as u32));
        fs::rename(&from, &to).map_err(|source| Error::FrameRenameError {
            from,
            to,
            source
        })?;
        renamed += 1;
    }

    Ok(renamed)
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn day_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
