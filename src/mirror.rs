use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;

use crate::config::MirrorConfig;

/// One source → destination pair handed to the mirroring program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorJob {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl MirrorJob {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        MirrorJob {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    /// Exited with one of the configured success codes
    Succeeded(i32),
    /// Exited with any other code, or was killed by a signal (`None`)
    Failed(Option<i32>),
    /// The program could not be started at all
    NotStarted(String),
}

#[derive(Debug, Clone)]
pub struct MirrorOutcome {
    pub job: MirrorJob,
    pub command: String,
    pub status: MirrorStatus,
}

impl MirrorOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, MirrorStatus::Succeeded(_))
    }
}

/// Runs the external mirroring program synchronously, one job at a time
pub struct Mirror<'a> {
    config: &'a MirrorConfig,
}

impl<'a> Mirror<'a> {
    pub fn new(config: &'a MirrorConfig) -> Self {
        Mirror { config }
    }

    /// Run every job in order. A failed job never stops the ones after it.
    pub fn run_all(&self, jobs: &[MirrorJob]) -> Vec<MirrorOutcome> {
        jobs.iter().map(|job| self.run(job)).collect()
    }

    pub fn run(&self, job: &MirrorJob) -> MirrorOutcome {
        let command = self.describe(job);
        tracing::debug!("Running: {}", command);

        let status = match Command::new(&self.config.program)
            .arg(&job.source)
            .arg(&job.destination)
            .args(&self.config.flags)
            .status()
        {
            Ok(exit) => match exit.code() {
                Some(code) if self.config.success_codes.contains(&code) => {
                    MirrorStatus::Succeeded(code)
                }
                code => MirrorStatus::Failed(code),
            },
            Err(e) => {
                tracing::error!("Failed to start {}: {}", self.config.program, e);
                MirrorStatus::NotStarted(e.to_string())
            }
        };

        match &status {
            MirrorStatus::Succeeded(_) => println!("Successfully executed: {}", command),
            MirrorStatus::Failed(Some(code)) => {
                println!("Error executing: {}, Return code: {}", command, code)
            }
            MirrorStatus::Failed(None) => {
                println!("Error executing: {}, terminated by signal", command)
            }
            MirrorStatus::NotStarted(reason) => {
                println!("Error executing: {}, could not start: {}", command, reason)
            }
        }

        MirrorOutcome {
            job: job.clone(),
            command,
            status,
        }
    }

    /// Human-readable command line, paths quoted
    fn describe(&self, job: &MirrorJob) -> String {
        let mut command = format!(
            "{} \"{}\" \"{}\"",
            self.config.program,
            job.source.display(),
            job.destination.display()
        );
        for flag in &self.config.flags {
            command.push(' ');
            command.push_str(flag);
        }
        command
    }
}
