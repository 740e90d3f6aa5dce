use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::launcher::{LaunchBackend, LaunchError, LaunchMechanism};
use crate::model::{Query, ProcessMatch};
use crate::process_table::ProcessTable;
use crate::resolver::Resolver;
use crate::shortcut_index::is_shortcut;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchOutcome {
    Launched {
        mechanism: LaunchMechanism,
        target: String,
    },
    NotLaunched,
}

impl LaunchOutcome {
    pub fn launched(&self) -> bool {
        matches!(self, Self::Launched { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminateOutcome {
    pub matched: Vec<ProcessMatch>,
    pub killed: Vec<String>,
}

impl TerminateOutcome {
    pub fn any_killed(&self) -> bool {
        !self.killed.is_empty()
    }
}

/// Launches, terminates and restarts applications by name.
pub struct ProcessController {
    resolver: Arc<Resolver>,
    backend: Arc<dyn LaunchBackend>,
    processes: Arc<dyn ProcessTable>,
    settle_interval: Duration,
}

impl ProcessController {
    pub fn new(
        resolver: Arc<Resolver>,
        backend: Arc<dyn LaunchBackend>,
        processes: Arc<dyn ProcessTable>,
        settle_interval: Duration,
    ) -> Self {
        Self {
            resolver,
            backend,
            processes,
            settle_interval,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Tries each launch mechanism in turn. An exhausted chain is
    /// `NotLaunched`; only a failure that rules out fallback is an error.
    pub fn launch(&self, query: &Query) -> Result<LaunchOutcome, LaunchError> {
        let raw = query.raw();

        if let Some(program) = self.backend.find_on_path(raw) {
            let attempt = self.backend.spawn(&program);
            if let Some(outcome) = step(LaunchMechanism::CommandPath, &program, attempt)? {
                return Ok(outcome);
            }
        }

        if let Some(target) = self.resolver.resolve(query).target {
            let attempt = if is_shortcut(&target.path) {
                self.backend.open_shortcut(&target.path)
            } else {
                self.backend.spawn(&target.path)
            };
            let mechanism = LaunchMechanism::Resolved(target.source);
            if let Some(outcome) = step(mechanism, &target.path, attempt)? {
                return Ok(outcome);
            }
        }

        let attempt = self.backend.shell_start(raw);
        if let Some(outcome) = step(LaunchMechanism::ShellStart, Path::new(raw), attempt)? {
            return Ok(outcome);
        }

        let attempt = self.backend.open_document(raw);
        if let Some(outcome) = step(LaunchMechanism::OpenDocument, Path::new(raw), attempt)? {
            return Ok(outcome);
        }

        log::info!("every launch mechanism failed for '{query}'");
        Ok(LaunchOutcome::NotLaunched)
    }

    /// Force-kills every running process whose image name matches `query`.
    pub fn terminate(&self, query: &Query) -> TerminateOutcome {
        let aliases = self.resolver.aliases().table().process_names(query);
        let own_pid = std::process::id();

        let matched: Vec<ProcessMatch> = self
            .processes
            .snapshot()
            .into_iter()
            .filter(|entry| entry.pid != own_pid)
            .filter(|entry| process_matches(query, aliases, &entry.name))
            .map(|entry| ProcessMatch {
                pid: entry.pid,
                reported_name: entry.name,
            })
            .collect();

        let mut killed = Vec::new();
        for process in &matched {
            if self.processes.kill(process.pid) {
                log::info!("killed {} (pid {})", process.reported_name, process.pid);
                killed.push(process.reported_name.clone());
            } else {
                log::warn!(
                    "could not kill {} (pid {})",
                    process.reported_name,
                    process.pid
                );
            }
        }

        if matched.is_empty() {
            log::info!("no running process matches '{query}'");
        }
        TerminateOutcome { matched, killed }
    }

    /// Terminate, wait for teardown, launch. A missing process does not
    /// stop the relaunch.
    pub fn restart(&self, query: &Query) -> Result<LaunchOutcome, LaunchError> {
        let terminated = self.terminate(query);
        log::debug!(
            "restart of '{query}' terminated {} process(es)",
            terminated.killed.len()
        );
        if !self.settle_interval.is_zero() {
            std::thread::sleep(self.settle_interval);
        }
        self.launch(query)
    }

    /// Distinct running image names with any `.exe` suffix removed, sorted
    /// case-insensitively.
    pub fn running_applications(&self, limit: usize) -> Vec<String> {
        let mut unique: BTreeMap<String, String> = BTreeMap::new();
        for entry in self.processes.snapshot() {
            if !counts_as_application(&entry.name) {
                continue;
            }
            let display = strip_exe(&entry.name).to_string();
            unique.entry(display.to_lowercase()).or_insert(display);
        }
        unique.into_values().take(limit).collect()
    }
}

fn step(
    mechanism: LaunchMechanism,
    target: &Path,
    attempt: Result<(), LaunchError>,
) -> Result<Option<LaunchOutcome>, LaunchError> {
    match attempt {
        Ok(()) => {
            log::info!("launched {} via {mechanism:?}", target.display());
            Ok(Some(LaunchOutcome::Launched {
                mechanism,
                target: target.to_string_lossy().into_owned(),
            }))
        }
        Err(error) if error.allows_fallback() => {
            log::debug!("{mechanism:?} did not launch {}: {error}", target.display());
            Ok(None)
        }
        Err(error) => {
            log::warn!("{mechanism:?} failed for {}: {error}", target.display());
            Err(error)
        }
    }
}

/// Alias image names match exactly (ignoring case); otherwise the query and
/// the image stem match when either contains the other.
pub fn process_matches(query: &Query, alias_images: &[String], image_name: &str) -> bool {
    if alias_images
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(image_name))
    {
        return true;
    }

    let lower = image_name.to_lowercase();
    let stem = strip_exe(&lower);
    if stem.is_empty() {
        return false;
    }
    stem.contains(query.as_str()) || query.as_str().contains(stem)
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

#[cfg(target_os = "windows")]
fn counts_as_application(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".exe")
}

#[cfg(not(target_os = "windows"))]
fn counts_as_application(name: &str) -> bool {
    !name.trim().is_empty()
}
