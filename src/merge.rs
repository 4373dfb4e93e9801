//! Combines the coverage profile of a test run with the profile of a rerun of some of its tests,
//! so coverage gathered by either attempt survives.
use crate::cover_profile::types::*;
use crate::cover_profile::{parse, write_profile, ProfileError};
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("parse rerun cover profile {}", path.display())]
    Rerun {
        path: PathBuf,
        #[source]
        source: ProfileError,
    },
    #[error("parse original cover profile {}", path.display())]
    Original {
        path: PathBuf,
        #[source]
        source: ProfileError,
    },
    #[error("coverprofile mode mismatch: original \"{original}\", rerun \"{rerun}\"")]
    ModeMismatch { original: CoverMode, rerun: CoverMode },
    #[error("write cover profile {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads the profiles at `original` and `rerun` and replaces the contents of `original` with
/// their merge.
///
/// A missing or empty rerun profile leaves `original` untouched. A missing or empty original is
/// replaced by the rerun profile. Nothing is written if either profile fails to parse or the
/// modes disagree.
pub fn merge_rerun(original: impl AsRef<Path>, rerun: impl AsRef<Path>) -> Result<(), MergeError> {
    let original = original.as_ref();
    let rerun = rerun.as_ref();

    let rerun_profile = match parse(rerun) {
        Ok(p) => p,
        Err(e) if e.is_not_found() => {
            debug!("No rerun profile at {}, nothing to merge", rerun.display());
            return Ok(());
        }
        Err(source) => {
            return Err(MergeError::Rerun {
                path: rerun.to_path_buf(),
                source,
            })
        }
    };
    if rerun_profile.is_empty() {
        debug!("Rerun profile {} is empty, nothing to merge", rerun.display());
        return Ok(());
    }

    let original_profile = match parse(original) {
        Ok(p) => p,
        Err(e) if e.is_not_found() => {
            debug!(
                "No original profile at {}, using rerun profile",
                original.display()
            );
            ProfileSet::default()
        }
        Err(source) => {
            return Err(MergeError::Original {
                path: original.to_path_buf(),
                source,
            })
        }
    };

    let merged = merge(original_profile, rerun_profile)?;
    debug!(
        "Writing {} files ({} blocks) to {}",
        merged.len(),
        merged.num_blocks(),
        original.display()
    );
    write_profile(original, &merged).map_err(|source| MergeError::Write {
        path: original.to_path_buf(),
        source,
    })
}

/// Merges `rerun` into `original`. Files and blocks only seen in one of the profiles are kept,
/// blocks in both have their counts combined according to the profile mode. The result has its
/// files sorted by name and the blocks in each file sorted by position.
pub fn merge(original: ProfileSet, rerun: ProfileSet) -> Result<ProfileSet, MergeError> {
    if rerun.is_empty() {
        return Ok(normalize(original));
    }
    if original.is_empty() {
        return Ok(normalize(rerun));
    }
    if original.mode != rerun.mode {
        return Err(MergeError::ModeMismatch {
            original: original.mode,
            rerun: rerun.mode,
        });
    }

    let mode = original.mode;
    let mut files = normalize(original).files;
    let mut index: FxHashMap<String, usize> = files
        .iter()
        .enumerate()
        .map(|(i, f)| (f.file_name.clone(), i))
        .collect();

    for mut file in rerun.files {
        match index.get(&file.file_name) {
            Some(&i) => merge_blocks(&mut files[i], file.blocks, mode),
            None => {
                debug!("{} only covered in rerun", file.file_name);
                file.fold_positions(mode);
                index.insert(file.file_name.clone(), files.len());
                files.push(file);
            }
        }
    }

    let mut result = ProfileSet { mode, files };
    result.sort_files();
    Ok(result)
}

/// Sorts a set and folds blocks sharing a position, so sets built by hand get the same shape as
/// parsed ones. Files with the same name are not combined.
fn normalize(mut profile: ProfileSet) -> ProfileSet {
    let mode = profile.mode;
    for file in &mut profile.files {
        file.fold_positions(mode);
    }
    profile.sort_files();
    profile
}

fn merge_blocks(file: &mut FileProfile, rerun: Vec<Block>, mode: CoverMode) {
    let mut index: FxHashMap<BlockPosition, usize> = file
        .blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.position(), i))
        .collect();

    for block in rerun {
        let position = block.position();
        match index.get(&position) {
            Some(&i) => {
                let existing = &mut file.blocks[i];
                if existing.num_stmt != block.num_stmt {
                    // Same position but different source, keep what the original run saw
                    warn!(
                        "{}:{}.{} has {} statements in the original profile but {} in the rerun",
                        file.file_name,
                        position.start_line,
                        position.start_col,
                        existing.num_stmt,
                        block.num_stmt
                    );
                }
                existing.count = mode.merge_counts(existing.count, block.count);
            }
            None => {
                index.insert(position, file.blocks.len());
                file.blocks.push(block);
            }
        }
    }
    file.sort_blocks();
}
