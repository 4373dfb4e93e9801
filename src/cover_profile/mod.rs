use crate::cover_profile::text_profile::*;
use crate::cover_profile::types::*;
use nom::{error::VerboseError, IResult};
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

pub mod text_profile;
pub mod types;

pub type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("cover profile is not valid UTF-8")]
    NotUtf8,
    #[error("bad mode line: {0:?}")]
    BadModeLine(String),
    #[error("unknown cover mode {0:?}")]
    UnknownMode(String),
    #[error("line {line_number} changes mode from {expected} to {found}")]
    ModeConflict {
        line_number: usize,
        expected: CoverMode,
        found: String,
    },
    #[error("line {line_number} {line:?} doesn't match expected format: {reason}")]
    MalformedLine {
        line_number: usize,
        line: String,
        reason: String,
    },
    #[error("{file_name}: inconsistent NumStmt: changed from {from} to {to}")]
    InconsistentNumStmt {
        file_name: String,
        from: usize,
        to: usize,
    },
}

impl ProfileError {
    /// The profile file doesn't exist, which callers may want to treat as an empty profile
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

pub fn parse(filename: impl AsRef<Path>) -> Result<ProfileSet, ProfileError> {
    let mut buffer = Vec::new();
    let mut f = File::open(filename)?;
    f.read_to_end(&mut buffer)?;
    parse_bytes(buffer.as_slice())
}

pub fn parse_bytes(data: &[u8]) -> Result<ProfileSet, ProfileError> {
    if data.is_empty() {
        return Ok(ProfileSet::default());
    }
    if !TextProfile::has_format(data) {
        let first_line = String::from_utf8_lossy(data)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        return Err(ProfileError::BadModeLine(first_line));
    }
    let text = std::str::from_utf8(data).map_err(|_| ProfileError::NotUtf8)?;
    TextProfile::parse_str(text)
}

pub trait ProfileWriter {
    fn write(&self, profile: &ProfileSet, writer: &mut impl Write) -> io::Result<()>;
}

/// Replaces the contents of `filename` with the text form of `profile`. An empty profile has no
/// mode to write so the file is left alone.
pub fn write_profile(filename: impl AsRef<Path>, profile: &ProfileSet) -> io::Result<()> {
    if profile.is_empty() {
        return Ok(());
    }
    let mut writer = BufWriter::new(File::create(filename)?);
    TextProfile.write(profile, &mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
