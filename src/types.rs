use std::fmt;
use std::path::PathBuf;

/// Where to look for a default config file when `--config` is not given.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// What to do when several search paths hold a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Load every file found; later paths override earlier ones.
    #[default]
    Merge,
    /// Load only the highest-priority (last listed) file found.
    FirstMatch,
}

/// Stages of one merge cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MergeState {
    Start,
    /// Command-line and env-bound flags have been written into the record.
    FlagsParsed,
    /// A snapshot of the flag-influenced record has been taken.
    Preserved,
    /// Configuration sources have been loaded over the record.
    Loaded,
    /// Supplied flag values have been restored from the snapshot.
    Reapplied,
    Validated,
    Done,
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeState::Start => "start",
            MergeState::FlagsParsed => "parsing flags",
            MergeState::Preserved => "preserving flag values",
            MergeState::Loaded => "loading configuration",
            MergeState::Reapplied => "reapplying flag values",
            MergeState::Validated => "validating configuration",
            MergeState::Done => "done",
        };
        f.write_str(s)
    }
}
