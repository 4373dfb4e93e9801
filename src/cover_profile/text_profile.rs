use crate::cover_profile::types::*;
use crate::cover_profile::{ParseResult, ProfileError, ProfileWriter};
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map_res, rest};
use nom::error::{context, VerboseError, VerboseErrorKind};
use nom::sequence::{preceded, separated_pair, tuple};
use rustc_hash::FxHashMap;
use std::io::{self, Write};
use std::str::FromStr;

const MODE_PREFIX: &str = "mode: ";

/// The line based text format written by `go test -coverprofile`:
///
/// ```text
/// mode: set
/// encoding/base64/base64.go:34.44,37.40 3 1
/// ```
///
/// After the mode line every line is `name.go:line.column,line.column numberOfStatements count`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextProfile;

fn decimal<T: FromStr>(input: &str) -> ParseResult<T> {
    map_res(digit1, |s: &str| s.parse::<T>())(input)
}

fn line_col(input: &str) -> ParseResult<(usize, usize)> {
    separated_pair(decimal::<usize>, char('.'), decimal::<usize>)(input)
}

fn block(input: &str) -> ParseResult<Block> {
    let (input, ((start_line, start_col), _, (end_line, end_col), _, num_stmt, _, count)) =
        all_consuming(tuple((
            context("start position", line_col),
            char(','),
            context("end position", line_col),
            char(' '),
            context("statement count", decimal::<usize>),
            char(' '),
            context("execution count", decimal::<u64>),
        )))(input)?;
    Ok((
        input,
        Block {
            start_line,
            start_col,
            end_line,
            end_col,
            num_stmt,
            count,
        },
    ))
}

fn describe_error(e: &VerboseError<&str>) -> String {
    e.errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(c) => Some(format!("invalid {}", c)),
            _ => None,
        })
        .unwrap_or_else(|| "expected `line.col,line.col numStmt count`".to_string())
}

/// Splits a block line into its file name and block. The position part never contains a colon
/// so the name is everything up to the last one, which keeps names like `C:/src/a.go` intact.
fn parse_line(line_number: usize, line: &str) -> Result<(&str, Block), ProfileError> {
    let malformed = |reason: String| ProfileError::MalformedLine {
        line_number,
        line: line.to_string(),
        reason,
    };
    let split = line
        .rfind(':')
        .ok_or_else(|| malformed("missing `:` after file name".to_string()))?;
    let (name, position) = (&line[..split], &line[split + 1..]);
    if name.is_empty() {
        return Err(malformed("file name cannot be blank".to_string()));
    }
    match block(position) {
        Ok((_, block)) => Ok((name, block)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(malformed(describe_error(&e))),
        Err(nom::Err::Incomplete(_)) => Err(malformed("unexpected end of line".to_string())),
    }
}

/// Folds blocks sharing a position into one. Expects the blocks to be sorted.
fn fold_duplicates(file: &mut FileProfile, mode: CoverMode) -> Result<(), ProfileError> {
    let blocks = std::mem::take(&mut file.blocks);
    let mut folded: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match folded.last_mut() {
            Some(last) if last.position() == block.position() => {
                if last.num_stmt != block.num_stmt {
                    return Err(ProfileError::InconsistentNumStmt {
                        file_name: file.file_name.clone(),
                        from: last.num_stmt,
                        to: block.num_stmt,
                    });
                }
                last.count = mode.fold_counts(last.count, block.count);
            }
            _ => folded.push(block),
        }
    }
    file.blocks = folded;
    Ok(())
}

impl TextProfile {
    pub fn parse_str(input: &str) -> Result<ProfileSet, ProfileError> {
        let mut lines = input.lines().enumerate().map(|(i, l)| (i + 1, l));
        let mode = match lines.next() {
            Some((_, line)) => Self::parse_header(line)?,
            None => return Ok(ProfileSet::default()),
        };
        let mut files: FxHashMap<&str, FileProfile> = FxHashMap::default();
        for (line_number, line) in lines {
            if let Some(found) = line.strip_prefix(MODE_PREFIX) {
                // concatenated profiles repeat the header
                if found != mode.as_str() {
                    return Err(ProfileError::ModeConflict {
                        line_number,
                        expected: mode,
                        found: found.to_string(),
                    });
                }
                continue;
            }
            let (name, block) = parse_line(line_number, line)?;
            files
                .entry(name)
                .or_insert_with(|| FileProfile::new(name))
                .blocks
                .push(block);
        }

        let mut result = ProfileSet::new(mode);
        for (_, mut file) in files {
            file.sort_blocks();
            fold_duplicates(&mut file, mode)?;
            result.files.push(file);
        }
        result.sort_files();
        Ok(result)
    }

    /// Parses the `mode: <mode>` line every profile starts with
    pub fn parse_header(line: &str) -> Result<CoverMode, ProfileError> {
        let res: ParseResult<&str> = preceded(tag(MODE_PREFIX), rest)(line);
        match res {
            Ok((_, mode)) if !mode.is_empty() => mode.parse(),
            _ => Err(ProfileError::BadModeLine(line.to_string())),
        }
    }

    pub fn has_format(input: &[u8]) -> bool {
        input.starts_with(MODE_PREFIX.as_bytes())
    }
}

impl ProfileWriter for TextProfile {
    fn write(&self, profile: &ProfileSet, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "{}{}", MODE_PREFIX, profile.mode)?;
        for file in &profile.files {
            for b in &file.blocks {
                writeln!(
                    writer,
                    "{}:{}.{},{}.{} {} {}",
                    file.file_name,
                    b.start_line,
                    b.start_col,
                    b.end_line,
                    b.end_col,
                    b.num_stmt,
                    b.count
                )?;
            }
        }
        Ok(())
    }
}
