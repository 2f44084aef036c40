//! Command-line interface.
//!
//! The terminal front end over the engine: it owns profile bookkeeping
//! (list/add/clone/remove), and for `run` it spawns the worker, renders
//! the event stream, wires Ctrl-C to the cancellation flag, and records
//! the run timestamp on the profile afterwards. The engine itself never
//! touches stored profile state.

use crate::config::AppConfig;
use crate::operation::{OperationEvent, OperationHandle};
use crate::output::ConsoleReporter;
use crate::profile::{DateSource, NameCase, OperationKind, Profile};
use crate::profile_manager::ProfileManager;
use chrono::TimeZone;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "datetidy",
    version,
    about = "Organize files into date-based directory trees"
)]
pub struct Cli {
    /// Use a specific configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List stored profiles.
    List,
    /// Add a new profile.
    Add(AddArgs),
    /// Clone a stored profile under a new name.
    Clone {
        /// Profile to clone.
        name: String,
        /// Name for the copy.
        new_name: String,
    },
    /// Remove a stored profile.
    Remove { name: String },
    /// Run a stored profile.
    Run {
        name: String,
        /// Simulate the run without touching the filesystem.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Unique profile name.
    pub name: String,

    /// Directory to scan for files.
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,

    /// Root of the date tree to create.
    #[arg(long, value_name = "DIR")]
    pub dest: PathBuf,

    /// Glob alternation over file names.
    #[arg(long, default_value = "{*.jpg,*.JPG}")]
    pub pattern: String,

    #[arg(long, value_enum, default_value_t = DateSource::ExifOriginal)]
    pub date_source: DateSource,

    /// Date-token path template.
    #[arg(long, default_value = "yyyy/MM/yyyy-MM-dd")]
    pub date_pattern: String,

    #[arg(long, value_enum, default_value_t = OperationKind::Copy)]
    pub operation: OperationKind,

    /// Only scan the top level of the source directory.
    #[arg(long)]
    pub no_recursive: bool,

    /// Do not traverse symlinked directories.
    #[arg(long)]
    pub no_follow_links: bool,

    /// Overwrite files already present at a destination.
    #[arg(long)]
    pub replace_existing: bool,

    #[arg(long, value_enum, default_value_t = NameCase::Unchanged)]
    pub case_base: NameCase,

    #[arg(long, value_enum, default_value_t = NameCase::Unchanged)]
    pub case_ext: NameCase,

    #[arg(long, default_value = "")]
    pub description: String,
}

impl AddArgs {
    fn into_profile(self) -> Profile {
        let mut profile = Profile::new(&self.name, self.source, self.dest);
        profile.description = self.description;
        profile.file_pattern = self.pattern;
        profile.date_source = self.date_source;
        profile.date_pattern = self.date_pattern;
        profile.operation = self.operation;
        profile.recursive = !self.no_recursive;
        profile.follow_links = !self.no_follow_links;
        profile.replace_existing = self.replace_existing;
        profile.case_base = self.case_base;
        profile.case_ext = self.case_ext;
        profile
    }
}

/// Entry point for the binary: loads config and the profile store, then
/// dispatches the subcommand.
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let config = AppConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let mut manager =
        ProfileManager::load(config.profile_store_path()).map_err(|e| e.to_string())?;

    match cli.command {
        Command::List => cmd_list(&manager),
        Command::Add(args) => cmd_add(&mut manager, args),
        Command::Clone { name, new_name } => cmd_clone(&mut manager, &name, &new_name),
        Command::Remove { name } => cmd_remove(&mut manager, &name),
        Command::Run { name, dry_run } => cmd_run(&config, &mut manager, &name, dry_run),
    }
}

fn cmd_list(manager: &ProfileManager) -> Result<(), String> {
    if manager.is_empty() {
        println!(
            "No profiles yet. Create one with 'datetidy add <name> --source <dir> --dest <dir>'."
        );
        return Ok(());
    }

    for profile in manager.profiles() {
        println!("{}", profile.summary());
        println!("last run     {}\n", last_run_display(profile.last_run));
    }
    Ok(())
}

fn cmd_add(manager: &mut ProfileManager, args: AddArgs) -> Result<(), String> {
    let profile = args.into_profile();
    profile.validate().map_err(|e| e.to_string())?;
    let name = profile.name.clone().unwrap_or_default();

    manager.add(profile).map_err(|e| e.to_string())?;
    manager.save().map_err(|e| e.to_string())?;
    println!("Saved profile '{}'.", name);
    Ok(())
}

fn cmd_clone(manager: &mut ProfileManager, name: &str, new_name: &str) -> Result<(), String> {
    let original = manager
        .get(name)
        .ok_or_else(|| format!("No profile named '{}'", name))?;

    // An unsaved clone has no name and no run history until stored.
    let mut clone = original.clone_unsaved();
    clone.name = Some(new_name.to_string());

    manager.add(clone).map_err(|e| e.to_string())?;
    manager.save().map_err(|e| e.to_string())?;
    println!("Cloned '{}' into '{}'.", name, new_name);
    Ok(())
}

fn cmd_remove(manager: &mut ProfileManager, name: &str) -> Result<(), String> {
    manager.remove(name).map_err(|e| e.to_string())?;
    manager.save().map_err(|e| e.to_string())?;
    println!("Removed profile '{}'.", name);
    Ok(())
}

fn cmd_run(
    config: &AppConfig,
    manager: &mut ProfileManager,
    name: &str,
    dry_run: bool,
) -> Result<(), String> {
    let mut profile = manager
        .get(name)
        .ok_or_else(|| format!("No profile named '{}'", name))?
        .clone();
    profile.dry_run = dry_run;

    // Report validation problems before a worker ever starts; the engine
    // re-checks and would refuse anyway.
    profile.validate().map_err(|e| e.to_string())?;

    println!("{}\n", profile.summary());

    let handle = OperationHandle::spawn(profile.clone());
    let cancel = handle.cancel.clone();
    ctrlc::set_handler(move || cancel.cancel()).map_err(|e| e.to_string())?;

    let mut reporter = ConsoleReporter::new(config.output.progress);
    let mut completed = false;
    let mut failed = false;
    for event in handle.events.iter() {
        match event {
            OperationEvent::Finished { .. } => completed = true,
            OperationEvent::Failed(_) => failed = true,
            _ => {}
        }
        reporter.handle(&event);
    }
    handle.join();

    if completed && !dry_run {
        profile.touch_last_run();
        manager.upsert(profile).map_err(|e| e.to_string())?;
        manager.save().map_err(|e| e.to_string())?;
    }

    if failed {
        return Err(format!("Run of profile '{}' failed", name));
    }
    Ok(())
}

fn last_run_display(last_run: i64) -> String {
    if last_run == 0 {
        return "-".to_string();
    }
    match chrono::Local.timestamp_opt(last_run, 0) {
        chrono::LocalResult::Single(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_args_build_a_profile() {
        let args = AddArgs {
            name: "vacation".to_string(),
            source: PathBuf::from("/photos/in"),
            dest: PathBuf::from("/photos/out"),
            pattern: "{*.png}".to_string(),
            date_source: DateSource::FileModified,
            date_pattern: "yyyy/MM".to_string(),
            operation: OperationKind::Move,
            no_recursive: true,
            no_follow_links: true,
            replace_existing: true,
            case_base: NameCase::Lower,
            case_ext: NameCase::Lower,
            description: "screenshots".to_string(),
        };

        let profile = args.into_profile();
        assert_eq!(profile.name.as_deref(), Some("vacation"));
        assert_eq!(profile.file_pattern, "{*.png}");
        assert!(!profile.recursive);
        assert!(!profile.follow_links);
        assert!(profile.replace_existing);
        assert_eq!(profile.operation, OperationKind::Move);
    }

    #[test]
    fn test_last_run_display() {
        assert_eq!(last_run_display(0), "-");
        assert!(last_run_display(1_625_000_000).starts_with("20"));
    }
}
