use std::sync::Arc;

use gate_core::Pid;

use crate::config::Config;
use crate::procfs;
use crate::table::{FilterError, PidTable};

/// Control-plane handle over the shared admission table.
///
/// Probes read the table directly; this handle is how the rest of the
/// agent keeps it current: [`track`] when a traced process starts,
/// [`untrack`] when it exits. Mutations must stay on a single
/// control-plane task; lookups never need coordination.
///
/// [`track`]: AdmissionControl::track
/// [`untrack`]: AdmissionControl::untrack
#[derive(Clone)]
pub struct AdmissionControl {
    table: Arc<PidTable>,
}

impl AdmissionControl {
    /// The shared table, for handing to probe handlers.
    pub fn table(&self) -> Arc<PidTable> {
        Arc::clone(&self.table)
    }

    /// Bring a process into scope.
    pub fn track(&self, pid: Pid) -> Result<(), FilterError> {
        log::debug!("tracking {pid}");
        self.table.insert(pid)
    }

    /// Take a process out of scope, typically on exit. Returns whether it
    /// was tracked.
    pub fn untrack(&self, pid: Pid) -> bool {
        log::debug!("untracking {pid}");
        self.table.remove(pid)
    }

    /// Number of processes currently in scope.
    pub fn tracked(&self) -> usize {
        self.table.len()
    }
}

/// Seed the admission table from the configuration.
///
/// Pid targets go straight in. Image targets are resolved by scanning
/// procfs once; this is best effort: processes whose image can't be read
/// (already gone, or not ours to inspect) are skipped with a debug line.
/// Processes appearing later are the control plane's job via
/// [`AdmissionControl::track`].
pub fn setup_admission_set(config: &Config) -> Result<AdmissionControl, FilterError> {
    let table = Arc::new(PidTable::with_capacity(config.table_capacity));
    for pid in &config.pid_targets {
        table.insert(*pid)?;
    }
    if !config.image_targets.is_empty() {
        match procfs::get_running_processes() {
            Ok(processes) => {
                for pid in processes {
                    let image = match procfs::get_process_image(pid) {
                        Ok(path) => path,
                        Err(err) => {
                            log::debug!("{err}");
                            continue;
                        }
                    };
                    let image = image.to_string_lossy();
                    if config.image_targets.iter().any(|target| *target == image) {
                        log::debug!("tracking {pid} {image}");
                        table.insert(pid)?;
                    }
                }
            }
            Err(err) => {
                log::error!("Error loading process list from procfs: {err}");
                log::error!("admission table will only contain pid targets");
            }
        }
    }
    Ok(AdmissionControl { table })
}
