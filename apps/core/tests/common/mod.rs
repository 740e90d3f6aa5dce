#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use appctl_core::alias_index::{AliasIndex, AliasTable};
use appctl_core::discovery::DiscoveryProvider;
use appctl_core::engine::AppEngine;
use appctl_core::launcher::{LaunchBackend, LaunchError};
use appctl_core::process_table::{ProcessEntry, ProcessTable};
use appctl_core::resolver::Resolver;

/// In-memory process table; killed pids disappear from later snapshots.
#[derive(Default)]
pub struct FakeProcessTable {
    processes: Mutex<Vec<ProcessEntry>>,
    killed: Mutex<Vec<u32>>,
}

impl FakeProcessTable {
    pub fn with(processes: &[(u32, &str)]) -> Self {
        Self {
            processes: Mutex::new(
                processes
                    .iter()
                    .map(|(pid, name)| ProcessEntry {
                        pid: *pid,
                        name: name.to_string(),
                    })
                    .collect(),
            ),
            killed: Mutex::new(Vec::new()),
        }
    }

    pub fn killed(&self) -> Vec<u32> {
        self.killed.lock().unwrap().clone()
    }
}

impl ProcessTable for FakeProcessTable {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        self.processes.lock().unwrap().clone()
    }

    fn kill(&self, pid: u32) -> bool {
        let mut processes = self.processes.lock().unwrap();
        let before = processes.len();
        processes.retain(|entry| entry.pid != pid);
        if processes.len() == before {
            return false;
        }
        self.killed.lock().unwrap().push(pid);
        true
    }
}

/// Launch backend with a scripted result per mechanism that records every
/// call as `mechanism:target`. With `watch` set, each call also records the
/// pids running at that moment.
pub struct ScriptedBackend {
    pub on_path: HashMap<String, PathBuf>,
    pub spawn: Result<(), LaunchError>,
    pub shortcut: Result<(), LaunchError>,
    pub shell: Result<(), LaunchError>,
    pub document: Result<(), LaunchError>,
    pub calls: Mutex<Vec<String>>,
    pub watch: Option<Arc<FakeProcessTable>>,
    pub running_at_call: Mutex<Vec<Vec<u32>>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            on_path: HashMap::new(),
            spawn: Err(LaunchError::NotFound("spawn".into())),
            shortcut: Err(LaunchError::NotFound("shortcut".into())),
            shell: Err(LaunchError::NotFound("shell".into())),
            document: Err(LaunchError::NotFound("document".into())),
            calls: Mutex::new(Vec::new()),
            watch: None,
            running_at_call: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn running_at_call(&self) -> Vec<Vec<u32>> {
        self.running_at_call.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        if let Some(processes) = &self.watch {
            let pids = processes.snapshot().iter().map(|entry| entry.pid).collect();
            self.running_at_call.lock().unwrap().push(pids);
        }
        self.calls.lock().unwrap().push(call);
    }
}

impl LaunchBackend for ScriptedBackend {
    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        self.on_path.get(name).cloned()
    }

    fn spawn(&self, program: &Path) -> Result<(), LaunchError> {
        self.record(format!("spawn:{}", program.display()));
        self.spawn.clone()
    }

    fn open_shortcut(&self, shortcut: &Path) -> Result<(), LaunchError> {
        self.record(format!("shortcut:{}", shortcut.display()));
        self.shortcut.clone()
    }

    fn shell_start(&self, name: &str) -> Result<(), LaunchError> {
        self.record(format!("shell:{name}"));
        self.shell.clone()
    }

    fn open_document(&self, target: &str) -> Result<(), LaunchError> {
        self.record(format!("document:{target}"));
        self.document.clone()
    }
}

pub fn empty_aliases() -> Arc<AliasIndex> {
    Arc::new(AliasIndex::new(AliasTable::new(), Vec::new()))
}

pub fn engine_with(
    aliases: Arc<AliasIndex>,
    providers: Vec<Box<dyn DiscoveryProvider>>,
    backend: Arc<ScriptedBackend>,
    processes: Arc<FakeProcessTable>,
) -> AppEngine {
    AppEngine::with_components(
        Resolver::new(aliases, providers),
        backend,
        processes,
        Duration::ZERO,
    )
}

/// Writes `path` (relative to `root`) with its parents, marked executable
/// on Unix.
pub fn touch_executable(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, b"bin").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}
