//! Naming and discovery of per-frame data files

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};

// external crates
use log::{debug, trace};

/// Frame and tick numbers encoded in a per-frame file name
///
/// Per-frame caches name their data files `<base>Frame<N>.mc` or
/// `<base>Frame<N>Tick<M>.mc`. The sample time is not stored in the file, it
/// is recovered from these numbers and the cache's time per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameName {
    /// Frame number
    pub frame: i32,
    /// Tick offset within the frame, zero when absent
    pub tick: i32,
    /// Everything after the last `Frame`, reused for the output name
    pub suffix: String,
}

impl FrameName {
    /// Parse the frame and tick numbers from a file stem
    ///
    /// The last occurrence of `Frame` is used, so base names that happen to
    /// contain the word still work.
    ///
    /// ```rust
    /// # use mctools_mcc::FrameName;
    /// let name = FrameName::parse("clothFrame12Tick40").unwrap();
    /// assert_eq!((name.frame, name.tick), (12, 40));
    /// assert_eq!(name.suffix, "12Tick40");
    /// ```
    pub fn parse(stem: &str) -> Result<Self> {
        let invalid = || Error::InvalidFrameName(stem.to_string());

        let (_, suffix) = stem.rsplit_once("Frame").ok_or_else(invalid)?;
        let (frame, tick) = match suffix.split_once("Tick") {
            Some((frame, tick)) => (frame, Some(tick)),
            None => (suffix, None),
        };

        let frame = frame.parse::<i32>().map_err(|_| invalid())?;
        let tick = match tick {
            Some(t) => t.parse::<i32>().map_err(|_| invalid())?,
            None => 0,
        };

        trace!("{stem}: frame {frame} tick {tick}");
        Ok(Self {
            frame,
            tick,
            suffix: suffix.to_string(),
        })
    }

    /// Absolute sample time in ticks
    ///
    /// `frame * time_per_frame + tick`, failing rather than wrapping if the
    /// result does not fit in 32 bits.
    pub fn ticks(&self, time_per_frame: i32) -> Result<i32> {
        self.frame
            .checked_mul(time_per_frame)
            .and_then(|t| t.checked_add(self.tick))
            .ok_or_else(|| Error::InvalidFrameName(format!("Frame{}", self.suffix)))
    }

    /// File name of the converted frame, `<output_base>Frame<suffix>.mc`
    pub fn output_file_name(&self, output_base: &str) -> String {
        format!("{output_base}Frame{}.mc", self.suffix)
    }
}

/// Find every per-frame data file for a cache
///
/// Returns the sorted paths of the regular files in `directory` with an `mc`
/// extension whose file name starts with `<base_name>Frame`, so caches with
/// a longer base name sharing the prefix are left out. Nothing is opened, so
/// the list may include files that later fail to parse.
pub fn discover_frame_files<P: AsRef<Path>>(directory: P, base_name: &str) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    let prefix = format!("{base_name}Frame");
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        let is_data_file = path.extension().is_some_and(|e| e == "mc");
        let matches_base = entry.file_name().to_string_lossy().starts_with(&prefix);

        if is_data_file && matches_base && entry.file_type()?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    debug!(
        "Found {} frame files for {base_name:?} in {}",
        files.len(),
        directory.display()
    );
    Ok(files)
}

/// True if `path` looks like a converted frame written for `output_base`
pub(crate) fn is_output_of(path: &Path, output_base: &str) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with(&format!("{output_base}Frame")))
        .unwrap_or(false)
}
