use crate::cover_profile::ProfileError;
use std::fmt;
use std::str::FromStr;

/// Counting discipline of a profile, given by the `mode:` header line. This decides how counts
/// for the same block are combined.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum CoverMode {
    /// Only records whether a block ran, counts are 0 or 1
    Set,
    /// Records how many times a block ran
    Count,
    /// Like `Count` but the instrumented binary incremented the counters atomically
    Atomic,
}

impl Default for CoverMode {
    fn default() -> Self {
        Self::Set
    }
}

impl CoverMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Count => "count",
            Self::Atomic => "atomic",
        }
    }

    /// Combines the counts two independent runs recorded for the same block. Set profiles take
    /// the bitwise or, count and atomic profiles take the maximum. Summing would count the
    /// retried tests twice.
    pub fn merge_counts(&self, original: u64, rerun: u64) -> u64 {
        match self {
            Self::Set => original | rerun,
            Self::Count | Self::Atomic => original.max(rerun),
        }
    }

    /// Combines counts for the same block appearing twice within one profile, which happens when
    /// profiles from several packages are concatenated.
    pub(crate) fn fold_counts(&self, a: u64, b: u64) -> u64 {
        match self {
            Self::Set => a | b,
            Self::Count | Self::Atomic => a.saturating_add(b),
        }
    }
}

impl fmt::Display for CoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverMode {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(Self::Set),
            "count" => Ok(Self::Count),
            "atomic" => Ok(Self::Atomic),
            e => Err(ProfileError::UnknownMode(e.to_string())),
        }
    }
}

/// Source range of a block, used as the key when matching blocks between profiles.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BlockPosition {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Block {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    /// Number of statements in the block
    pub num_stmt: usize,
    /// Execution count, or 0/1 for set mode
    pub count: u64,
}

impl Block {
    pub fn position(&self) -> BlockPosition {
        BlockPosition {
            start_line: self.start_line,
            start_col: self.start_col,
            end_line: self.end_line,
            end_col: self.end_col,
        }
    }
}

/// All blocks recorded for one source file.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct FileProfile {
    pub file_name: String,
    pub blocks: Vec<Block>,
}

impl FileProfile {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            blocks: vec![],
        }
    }

    /// Orders blocks by start position, falling back to the end position for blocks starting at
    /// the same place.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|b| b.position());
    }

    /// Sorts the blocks and merges any sharing a position with [`CoverMode::merge_counts`],
    /// keeping the first block's `num_stmt`.
    pub fn fold_positions(&mut self, mode: CoverMode) {
        self.sort_blocks();
        self.blocks.dedup_by(|later, kept| {
            if later.position() == kept.position() {
                kept.count = mode.merge_counts(kept.count, later.count);
                true
            } else {
                false
            }
        });
    }
}

/// A whole coverage profile. Every file shares the set's mode, and the mode of a set with no
/// files is meaningless.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ProfileSet {
    pub mode: CoverMode,
    pub files: Vec<FileProfile>,
}

impl ProfileSet {
    pub fn new(mode: CoverMode) -> Self {
        Self {
            mode,
            files: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn num_blocks(&self) -> usize {
        self.files.iter().map(|x| x.blocks.len()).sum()
    }

    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    }
}
