//! Utility functions used to extract data from procfs

use std::io;
use std::path::PathBuf;

use gate_core::Pid;
use glob::glob;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcfsError {
    #[error("reading link failed {path}")]
    ReadFile {
        #[source]
        source: io::Error,
        path: String,
    },

    #[error("globbing running processes")]
    GlobbingError(#[from] glob::PatternError),
    #[error("unreadable entry")]
    GlobError(#[from] glob::GlobError),
    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}

/// Returns the path of the executable image of a given process.
pub fn get_process_image(pid: Pid) -> Result<PathBuf, ProcfsError> {
    read_link(&format!("/proc/{pid}/exe"))
}

/// Returns every process currently listed in procfs.
pub fn get_running_processes() -> Result<Vec<Pid>, ProcfsError> {
    glob("/proc/[0-9]*")?
        .map(|entry| {
            let pid: i32 = entry?
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .parse()?;
            Ok(Pid::from_raw(pid))
        })
        .collect()
}

/// Return where a link is pointing to.
fn read_link(path: &str) -> Result<PathBuf, ProcfsError> {
    std::fs::read_link(path).map_err(|source| ProcfsError::ReadFile {
        source,
        path: path.to_string(),
    })
}
