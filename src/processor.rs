use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;

use crate::archive::{archive_dir, archive_files, ArchivedFile};
use crate::config::Config;
use crate::mirror::{Mirror, MirrorOutcome};
use crate::report::{consolidate, Consolidation};
use crate::scan::list_text_files;

/// Runs the whole pass over one directory: consolidate, archive, mirror
pub struct Processor {
    directory: PathBuf,
    config: Config,
    archive: bool,
    mirror: bool,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub total_files: usize,
    pub consolidation: Consolidation,
    pub archived: Vec<ArchivedFile>,
    pub mirror_outcomes: Vec<MirrorOutcome>,
}

impl RunReport {
    pub fn mirror_failures(&self) -> usize {
        self.mirror_outcomes.iter().filter(|o| !o.is_success()).count()
    }
}

impl Processor {
    pub fn new(directory: PathBuf, config: Config) -> Self {
        Processor {
            directory,
            config,
            archive: true,
            mirror: true,
        }
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn run(&self) -> Result<RunReport> {
        self.run_at(&Local::now().naive_local())
    }

    /// Run with a fixed clock; every date and file name of the pass derives from `now`
    pub fn run_at(&self, now: &NaiveDateTime) -> Result<RunReport> {
        tracing::info!("Consolidating counters in {}", self.directory.display());

        let files = list_text_files(&self.directory)?;
        let mut report = RunReport {
            total_files: files.len(),
            ..Default::default()
        };
        tracing::info!("Found {} counter files", files.len());

        report.consolidation = consolidate(&self.directory, &files, now)?;

        if self.archive {
            let target = archive_dir(&self.directory, &self.config.archive_dir_name, now);
            // Skipped files go too: everything listed in this pass is archived
            report.archived = archive_files(&files, &target, now)?;
        } else {
            tracing::info!("Archiving disabled, leaving counter files in place");
        }

        if self.mirror {
            let mirror = Mirror::new(&self.config.mirror);
            report.mirror_outcomes = mirror.run_all(&self.config.mirror.jobs);
        } else {
            tracing::info!("Mirroring disabled");
        }

        self.print_summary(&report);
        Ok(report)
    }

    fn print_summary(&self, report: &RunReport) {
        let consolidation = &report.consolidation;

        println!();
        println!("=== CONSOLIDATION COMPLETE ===");
        println!("Counter files found: {}", report.total_files);
        println!("Rows written: {}", consolidation.rows.len());
        println!("Skipped (fewer than two lines): {}", consolidation.skipped.len());
        if self.archive {
            println!("Archived: {}", report.archived.len());
        }
        if self.mirror {
            println!(
                "Mirror commands: {} ok, {} failed",
                report.mirror_outcomes.len() - report.mirror_failures(),
                report.mirror_failures()
            );
        }

        if !consolidation.summary.is_empty() {
            println!();
            println!("=== SUMMARY ===");
            for (name, total) in &consolidation.summary {
                println!("{}: {}", name, total);
            }
            println!("Total: {}", consolidation.total);
        }
    }
}
