//! Console rendering of run events.
//!
//! The engine reports through [`OperationEvent`]s; this module turns that
//! stream into colored terminal output with an optional progress bar.
//! Everything here is presentation only and changes nothing about a run.

use crate::operation::OperationEvent;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Renders an event stream to the terminal.
pub struct ConsoleReporter {
    show_progress: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            bar: None,
        }
    }

    /// Renders one event. Events must arrive in emission order; the
    /// progress bar is created on the first `Progress` and closed by the
    /// terminal event.
    pub fn handle(&mut self, event: &OperationEvent) {
        match event {
            OperationEvent::Started => {}
            OperationEvent::ProcessingStarted => {
                println!("{}", "Scanning source tree...".cyan());
            }
            OperationEvent::Progress { value, max } => {
                if self.show_progress {
                    let bar = self
                        .bar
                        .get_or_insert_with(|| Self::create_progress_bar(*max as u64));
                    bar.set_position(*value as u64);
                }
            }
            OperationEvent::Log(message) => match &self.bar {
                Some(bar) => bar.println(message),
                None => println!("{}", message),
            },
            OperationEvent::Failed(message) => {
                self.close_bar();
                eprintln!("{} {}", "✗".red(), message);
            }
            OperationEvent::Finished { message, .. } => {
                self.close_bar();
                println!("{} {}", "✓".green(), message);
            }
            OperationEvent::Interrupted => {
                self.close_bar();
                println!("{} {}", "⚠".yellow(), "Run interrupted".yellow());
            }
        }
    }

    fn close_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn create_progress_bar(total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        bar
    }
}

/// Prints an error message in red with an X mark.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}
