use std::sync::Mutex;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// A live view of the OS process table.
pub trait ProcessTable: Send + Sync {
    fn snapshot(&self) -> Vec<ProcessEntry>;
    /// Forcefully terminates `pid`; `false` when it is gone or cannot be
    /// signaled.
    fn kill(&self, pid: u32) -> bool;
}

pub struct SystemProcessTable {
    system: Mutex<System>,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_with_specifics(
                RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing()),
            )),
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let Ok(mut system) = self.system.lock() else {
            log::warn!("process table lock poisoned; reporting no processes");
            return Vec::new();
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let mut entries: Vec<ProcessEntry> = system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .filter(|entry| !entry.name.is_empty())
            .collect();
        entries.sort_by_key(|entry| entry.pid);
        entries
    }

    fn kill(&self, pid: u32) -> bool {
        let Ok(system) = self.system.lock() else {
            return false;
        };
        match system.process(Pid::from_u32(pid)) {
            Some(process) => process.kill(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ProcessTable, SystemProcessTable};

    #[test]
    fn snapshot_contains_current_process() {
        let table = SystemProcessTable::new();
        let own_pid = std::process::id();
        assert!(table.snapshot().iter().any(|entry| entry.pid == own_pid));
    }

    #[test]
    fn killing_unknown_pid_reports_false() {
        let table = SystemProcessTable::new();
        let _ = table.snapshot();
        assert!(!table.kill(u32::MAX - 7));
    }
}
