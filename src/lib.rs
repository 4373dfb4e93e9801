pub mod args;
pub mod cover_profile;
pub mod merge;

pub use crate::args::extract_flag_value;
pub use crate::cover_profile::types::*;
pub use crate::cover_profile::{parse, parse_bytes, write_profile, ProfileError};
pub use crate::merge::{merge, merge_rerun, MergeError};
