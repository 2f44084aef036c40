//! Destination conflict handling.
//!
//! Collisions never abort a run and never invent renamed duplicates: a
//! taken destination is either overwritten (when the profile allows it)
//! or the file is skipped and left untouched at its source.

use std::path::Path;

/// Decision for one candidate destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Destination is free, or overwriting is allowed.
    Proceed,
    /// Destination is taken; leave the source file where it is.
    Skip,
}

/// Decides whether a transfer to `dest` may go ahead.
///
/// A destination equal to the source itself is always skipped, regardless
/// of `replace_existing`; copying a file onto itself would truncate it.
pub fn resolve(source: &Path, dest: &Path, replace_existing: bool) -> Resolution {
    if source == dest {
        return Resolution::Skip;
    }
    if !dest.exists() || replace_existing {
        Resolution::Proceed
    } else {
        Resolution::Skip
    }
}
