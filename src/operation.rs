//! Run orchestration: enumeration, per-file processing, transfer, events.
//!
//! An [`Operation`] drives one profile end-to-end on whatever thread calls
//! [`Operation::run`]; [`OperationHandle::spawn`] puts it on a dedicated
//! worker and hands the caller a channel of events plus a cancellation
//! flag. Files are processed strictly in enumeration order, one at a time,
//! and the flag is polled between files; a transfer already underway is
//! never preempted.
//!
//! Event ordering per run: one `Started`, one `ProcessingStarted`, then
//! `Progress`/`Log` interleaved in call order, then exactly one of
//! `Finished`, `Failed` or `Interrupted`.

use crate::conflict_resolver::{self, Resolution};
use crate::file_matcher::{self, SelectionPattern};
use crate::path_template::PathTemplate;
use crate::profile::{OperationKind, Profile};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

/// Everything a run reports, in the order it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationEvent {
    /// Fired once, before any file is touched.
    Started,
    /// Fired once, when enumeration of the source tree begins.
    ProcessingStarted,
    /// Fired after each processed file; `value` counts up to `max`.
    Progress { value: usize, max: usize },
    /// One notable action: a transfer, a skip, or a per-file error.
    Log(String),
    /// Terminal: precondition or environment failure, nothing more runs.
    Failed(String),
    /// Terminal: the run completed; `file_count` files were transferred.
    Finished { message: String, file_count: usize },
    /// Terminal: cancellation was observed between files.
    Interrupted,
}

impl OperationEvent {
    /// True for the three events that end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationEvent::Failed(_)
                | OperationEvent::Finished { .. }
                | OperationEvent::Interrupted
        )
    }
}

/// Event sink invoked synchronously from the run's thread.
///
/// Implemented for any `FnMut(OperationEvent)`, so a caller can collect
/// events into a buffer, forward them over a channel, or render them
/// directly.
pub trait OperationListener {
    fn on_event(&mut self, event: OperationEvent);
}

impl<F: FnMut(OperationEvent)> OperationListener for F {
    fn on_event(&mut self, event: OperationEvent) {
        self(event);
    }
}

/// Shared cancellation flag, polled by the run between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the run stops before starting another file.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of a run. The three right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Preparing,
    Running,
    Finished,
    Failed,
    Interrupted,
}

/// One matched file moving through the run. Built during enumeration,
/// resolved while the file is processed, discarded afterwards.
#[derive(Debug)]
struct FileTask {
    source: PathBuf,
    outcome: TaskOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Pending,
    Transferred,
    SkippedConflict,
    DateUnavailable,
    TransferFailed,
}

impl FileTask {
    fn new(source: PathBuf) -> Self {
        Self {
            source,
            outcome: TaskOutcome::Pending,
        }
    }
}

/// A single reorganization run over one profile.
pub struct Operation<L: OperationListener> {
    profile: Profile,
    listener: L,
    cancel: CancelFlag,
    state: OperationState,
}

impl<L: OperationListener> Operation<L> {
    pub fn new(profile: Profile, listener: L, cancel: CancelFlag) -> Self {
        Self {
            profile,
            listener,
            cancel,
            state: OperationState::Idle,
        }
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    /// Runs to completion and returns the terminal state. Exactly one
    /// terminal event is fired, whatever happens in between.
    pub fn run(mut self) -> OperationState {
        self.listener.on_event(OperationEvent::Started);
        self.state = OperationState::Preparing;

        if let Err(e) = self.profile.validate() {
            return self.fail(e.to_string());
        }

        // Validation already proved the pattern parses.
        let pattern = match SelectionPattern::parse(&self.profile.file_pattern) {
            Ok(pattern) => pattern,
            Err(e) => return self.fail(e.to_string()),
        };
        let template = PathTemplate::new(&self.profile.date_pattern);

        if !self.profile.dry_run
            && let Err(e) = fs::create_dir_all(&self.profile.dest_dir)
        {
            return self.fail(format!(
                "Cannot create destination root {}: {}",
                self.profile.dest_dir.display(),
                e
            ));
        }

        self.listener.on_event(OperationEvent::ProcessingStarted);
        let enumeration = file_matcher::enumerate(
            &self.profile.source_dir,
            &pattern,
            self.profile.recursive,
            self.profile.follow_links,
        );
        let mut error_count = enumeration.errors.len();
        for problem in enumeration.errors {
            self.log(problem);
        }

        let mut tasks: Vec<FileTask> = enumeration.files.into_iter().map(FileTask::new).collect();
        let max = tasks.len();

        self.state = OperationState::Running;
        let mut transferred = 0;
        let mut skipped = 0;

        for (index, task) in tasks.iter_mut().enumerate() {
            if self.cancel.is_cancelled() {
                self.state = OperationState::Interrupted;
                self.listener.on_event(OperationEvent::Interrupted);
                return self.state;
            }

            match process_file(&self.profile, &template, &task.source, &mut |message| {
                self.listener.on_event(OperationEvent::Log(message))
            }) {
                Ok(outcome) => task.outcome = outcome,
                Err(fatal) => return self.fail(fatal),
            }

            match task.outcome {
                TaskOutcome::Transferred => transferred += 1,
                TaskOutcome::SkippedConflict => skipped += 1,
                TaskOutcome::DateUnavailable | TaskOutcome::TransferFailed => error_count += 1,
                TaskOutcome::Pending => {}
            }

            self.listener.on_event(OperationEvent::Progress {
                value: index + 1,
                max,
            });
        }

        let mut message = format!(
            "{} {} of {} files",
            if self.profile.dry_run {
                "Would transfer"
            } else {
                "Transferred"
            },
            transferred,
            max
        );
        if skipped > 0 || error_count > 0 {
            message.push_str(&format!(" ({} skipped, {} failed)", skipped, error_count));
        }

        self.state = OperationState::Finished;
        self.listener.on_event(OperationEvent::Finished {
            message,
            file_count: transferred,
        });
        self.state
    }

    fn log(&mut self, message: String) {
        self.listener.on_event(OperationEvent::Log(message));
    }

    fn fail(&mut self, message: String) -> OperationState {
        self.state = OperationState::Failed;
        self.listener.on_event(OperationEvent::Failed(message));
        self.state
    }
}

/// Processes one file: date, destination, conflict decision, transfer.
///
/// Per-file problems are logged and returned as an outcome; only an
/// environment-level failure (storage exhausted) is returned as `Err` and
/// aborts the run. Under dry-run the transfer line is emitted exactly as
/// a real run would emit it, and nothing is written.
fn process_file(
    profile: &Profile,
    template: &PathTemplate,
    source: &Path,
    log: &mut dyn FnMut(String),
) -> Result<TaskOutcome, String> {
    let Some(date) = profile.date_source.extract(source) else {
        log(format!(
            "no {} date for {}, skipped",
            profile.date_source,
            source.display()
        ));
        return Ok(TaskOutcome::DateUnavailable);
    };

    let base_name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source.extension().map(|e| e.to_string_lossy().into_owned());

    let relative = template.expand(
        date,
        &base_name,
        extension.as_deref(),
        profile.case_base,
        profile.case_ext,
    );
    let dest = profile.dest_dir.join(relative);

    match conflict_resolver::resolve(source, &dest, profile.replace_existing) {
        Resolution::Skip => {
            log(format!("skip {} (destination taken)", dest.display()));
            return Ok(TaskOutcome::SkippedConflict);
        }
        Resolution::Proceed => {}
    }

    // Same line under dry-run and real runs.
    log(format!(
        "{} {} -> {}",
        profile.operation.verb(),
        source.display(),
        dest.display()
    ));

    if profile.dry_run {
        return Ok(TaskOutcome::Transferred);
    }

    match transfer(source, &dest, profile.operation) {
        Ok(()) => Ok(TaskOutcome::Transferred),
        Err(e) if e.kind() == io::ErrorKind::StorageFull => {
            Err(format!("storage exhausted at {}: {}", dest.display(), e))
        }
        Err(e) => {
            log(format!("failed {}: {}", source.display(), e));
            Ok(TaskOutcome::TransferFailed)
        }
    }
}

/// Copies or moves one file, creating the destination directories first.
///
/// A move renames when source and destination share a filesystem and
/// otherwise copies first, removing the source only after the copy
/// succeeded.
fn transfer(source: &Path, dest: &Path, kind: OperationKind) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    match kind {
        OperationKind::Copy => {
            fs::copy(source, dest)?;
        }
        OperationKind::Move => {
            if fs::rename(source, dest).is_err() {
                fs::copy(source, dest)?;
                fs::remove_file(source)?;
            }
        }
    }
    Ok(())
}

/// A run placed on its own worker thread.
///
/// Events arrive on `events` in emission order; dropping the handle
/// without joining leaves the worker running to its terminal event.
pub struct OperationHandle {
    pub events: mpsc::Receiver<OperationEvent>,
    pub cancel: CancelFlag,
    worker: thread::JoinHandle<OperationState>,
}

impl OperationHandle {
    /// Spawns the run for `profile` on a dedicated thread.
    pub fn spawn(profile: Profile) -> Self {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let worker = thread::spawn(move || {
            let listener = move |event: OperationEvent| {
                // A caller that stopped listening just discards events.
                let _ = tx.send(event);
            };
            Operation::new(profile, listener, worker_cancel).run()
        });
        Self {
            events: rx,
            cancel,
            worker,
        }
    }

    /// Waits for the run's terminal state.
    pub fn join(self) -> OperationState {
        self.worker.join().unwrap_or(OperationState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DateSource;
    use std::fs;
    use tempfile::TempDir;

    fn profile(source: &Path, dest: &Path) -> Profile {
        let mut p = Profile::new("test", source.to_path_buf(), dest.to_path_buf());
        p.date_source = DateSource::FileModified;
        p
    }

    fn run_collecting(p: Profile) -> (OperationState, Vec<OperationEvent>) {
        let mut events = Vec::new();
        let state = Operation::new(p, |e: OperationEvent| events.push(e), CancelFlag::new()).run();
        (state, events)
    }

    #[test]
    fn test_empty_source_finishes_with_zero_files() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (state, events) = run_collecting(profile(source.path(), dest.path()));

        assert_eq!(state, OperationState::Finished);
        assert_eq!(events.first(), Some(&OperationEvent::Started));
        assert!(matches!(
            events.last(),
            Some(OperationEvent::Finished { file_count: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_profile_fails_before_any_io() {
        let dest = TempDir::new().unwrap();
        let p = profile(Path::new("/no/such/source"), dest.path());
        let (state, events) = run_collecting(p);

        assert_eq!(state, OperationState::Failed);
        assert!(matches!(events.last(), Some(OperationEvent::Failed(_))));
        assert!(!events.contains(&OperationEvent::ProcessingStarted));
    }

    #[test]
    fn test_exactly_one_terminal_event() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"x").unwrap();

        let (_, events) = run_collecting(profile(source.path(), dest.path()));
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1);
    }

    #[test]
    fn test_copy_leaves_source_intact() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"payload").unwrap();

        let (state, _) = run_collecting(profile(source.path(), dest.path()));
        assert_eq!(state, OperationState::Finished);
        assert!(source.path().join("a.jpg").exists());

        let copies: Vec<_> = walkdir::WalkDir::new(dest.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        assert_eq!(copies.len(), 1);
        assert!(copies[0].file_name().to_string_lossy().ends_with("a.jpg"));
    }

    #[test]
    fn test_move_removes_source() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"payload").unwrap();

        let mut p = profile(source.path(), dest.path());
        p.operation = OperationKind::Move;
        let (state, _) = run_collecting(p);

        assert_eq!(state, OperationState::Finished);
        assert!(!source.path().join("a.jpg").exists());
    }

    #[test]
    fn test_cancellation_before_first_file() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"x").unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut events = Vec::new();
        let state = Operation::new(
            profile(source.path(), dest.path()),
            |e: OperationEvent| events.push(e),
            cancel,
        )
        .run();

        assert_eq!(state, OperationState::Interrupted);
        assert_eq!(events.last(), Some(&OperationEvent::Interrupted));
        assert!(source.path().join("a.jpg").exists());
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, OperationEvent::Finished { .. }))
        );
    }

    #[test]
    fn test_progress_counts_every_file() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(source.path().join(name), b"x").unwrap();
        }

        let (_, events) = run_collecting(profile(source.path(), dest.path()));
        let progress: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                OperationEvent::Progress { value, max } => Some((*value, *max)),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_date_unavailable_is_per_file_not_fatal() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"no exif here").unwrap();

        let mut p = profile(source.path(), dest.path());
        p.date_source = DateSource::ExifOriginal;
        let (state, events) = run_collecting(p);

        assert_eq!(state, OperationState::Finished);
        assert!(matches!(
            events.last(),
            Some(OperationEvent::Finished { file_count: 0, .. })
        ));
        assert!(events.iter().any(
            |e| matches!(e, OperationEvent::Log(line) if line.contains("no exif original date"))
        ));
        assert!(source.path().join("a.jpg").exists());
    }

    #[test]
    fn test_spawned_run_delivers_events_in_order() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"x").unwrap();

        let handle = OperationHandle::spawn(profile(source.path(), dest.path()));
        let events: Vec<_> = handle.events.iter().collect();
        assert_eq!(handle.join(), OperationState::Finished);

        assert_eq!(events.first(), Some(&OperationEvent::Started));
        assert_eq!(events.get(1), Some(&OperationEvent::ProcessingStarted));
        assert!(events.last().unwrap().is_terminal());
    }
}
