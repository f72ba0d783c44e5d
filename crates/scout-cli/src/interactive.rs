//! Keyboard control of a running search, and progress on stderr.

use std::io::BufRead;
use std::str::FromStr;

use tokio::sync::mpsc;

use scout_core::{IngestEvent, IngestReporter};

/// A line typed while a search is ingesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p" | "pause" => Ok(ControlCommand::Pause),
            "r" | "resume" => Ok(ControlCommand::Resume),
            "s" | "stop" | "q" | "quit" => Ok(ControlCommand::Stop),
            other => Err(format!("Unknown command '{other}' (use p, r or s)")),
        }
    }
}

/// Lines from stdin, read on a dedicated OS thread.
///
/// A blocking thread rather than `tokio::io::stdin` so the runtime can shut
/// down while a read is still pending.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Prints one line per committed record and the lifecycle transitions.
pub struct ProgressReporter;

impl IngestReporter for ProgressReporter {
    fn report(&self, event: IngestEvent<'_>) {
        match event {
            IngestEvent::Fetched { count, .. } => {
                eprintln!("Source returned {count} listings");
            }
            IngestEvent::RecordPersisted {
                record,
                total_records,
                ..
            } => {
                eprintln!("  [{total_records:>4}] {}", record.listing.name);
            }
            IngestEvent::RecordFailed {
                position, error, ..
            } => {
                eprintln!("  [skip] #{position}: {error}");
            }
            IngestEvent::Paused { .. } => eprintln!("-- paused (r to resume, s to stop)"),
            IngestEvent::Resumed { .. } => eprintln!("-- resumed"),
            IngestEvent::Cancelled { total_records, .. } => {
                eprintln!("-- stopped after {total_records} records");
            }
            IngestEvent::Processed { summary, .. } => {
                eprintln!(
                    "Kept {} of {} listings ({} duplicates removed)",
                    summary.processed, summary.total_raw, summary.duplicates_removed
                );
            }
            IngestEvent::Started { .. } | IngestEvent::Completed { .. } => {}
        }
    }
}
