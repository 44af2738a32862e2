//! CSV export of run results
//!
//! Two tables, appended run after run:
//!
//! ```text
//! summary.csv  protocol,tag,run,injected,served,avg_latency,throughput,forwards,hitsSent,hitsRecv
//! queries.csv  protocol,tag,run,qid,start,hit,latency
//! ```
//!
//! The header row is written only when a file is new or empty, so several
//! experiments can share one output directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use p2p_search::Result;
use serde::Serialize;

use super::config::OutputConfig;
use super::runner::RunReport;

pub const SUMMARY_HEADER: [&str; 10] = [
    "protocol",
    "tag",
    "run",
    "injected",
    "served",
    "avg_latency",
    "throughput",
    "forwards",
    "hitsSent",
    "hitsRecv",
];

pub const QUERIES_HEADER: [&str; 7] = ["protocol", "tag", "run", "qid", "start", "hit", "latency"];

pub struct CsvExporter {
    dir: PathBuf,
    summary_file: String,
    queries_file: String,
}

impl CsvExporter {
    /// None when no output directory is configured.
    pub fn from_config(output: &OutputConfig) -> Option<Self> {
        output.dir.as_ref().map(|dir| Self {
            dir: PathBuf::from(dir),
            summary_file: output.summary_file.clone(),
            queries_file: output.queries_file.clone(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(&self.summary_file)
    }

    pub fn queries_path(&self) -> PathBuf {
        self.dir.join(&self.queries_file)
    }

    pub fn export(&self, report: &RunReport) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        append_rows(&self.summary_path(), &SUMMARY_HEADER, std::slice::from_ref(&report.summary))?;
        append_rows(&self.queries_path(), &QUERIES_HEADER, &report.queries)?;
        Ok(())
    }
}

fn append_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let file: File = OpenOptions::new().create(true).append(true).open(path)?;
    let is_empty = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if is_empty {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
