//! datetidy - organize files into date-based directory trees
//!
//! This library scans a source tree for files matching a glob group,
//! derives a date per file (EXIF capture date or filesystem timestamps),
//! expands a date-pattern template into a destination path, and copies or
//! moves each file there. Runs execute on a worker thread, report through
//! an ordered event stream, and honor cooperative cancellation. A dry-run
//! mode produces the same log output without touching the filesystem.

pub mod cli;
pub mod config;
pub mod conflict_resolver;
pub mod date_extractor;
pub mod file_matcher;
pub mod operation;
pub mod output;
pub mod path_template;
pub mod profile;
pub mod profile_manager;

pub use config::{AppConfig, ConfigError};
pub use conflict_resolver::Resolution;
pub use file_matcher::SelectionPattern;
pub use operation::{
    CancelFlag, Operation, OperationEvent, OperationHandle, OperationListener, OperationState,
};
pub use path_template::PathTemplate;
pub use profile::{DateSource, NameCase, OperationKind, Profile, ProfileError};
pub use profile_manager::{ProfileManager, StoreError};
