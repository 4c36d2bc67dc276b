//! Pipeline stages and their timing.

use std::fmt;
use std::fmt::Display;
use std::time::Duration;

/// Sorting pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input is split into chunk files.
    Split,
    /// Chunk files are sorted in parallel.
    Sort,
    /// Sorted chunks are merged into the output.
    Merge,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Split => "chunk split",
            Stage::Sort => "chunk sort",
            Stage::Merge => "chunk merge",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives the duration of every pipeline stage, whether it succeeded or not.
pub trait StageObserver {
    fn stage_finished(&self, stage: Stage, elapsed: Duration);
}

/// Observer logging stage durations at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl StageObserver for LogObserver {
    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        log::info!("elapsed for {}: {}", stage, format_elapsed(elapsed));
    }
}

impl<O: StageObserver + ?Sized> StageObserver for &O {
    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        (**self).stage_finished(stage, elapsed)
    }
}

/// Formats a duration as `HH:MM:SS.cc`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        secs / 3600,
        secs / 60 % 60,
        secs % 60,
        elapsed.subsec_millis() / 10
    )
}
