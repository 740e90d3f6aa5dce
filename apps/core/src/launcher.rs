use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command_path::find_command;
use crate::model::CandidateSource;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("target not found: {0}")]
    NotFound(String),
    #[error("{mechanism} rejected '{target}': {message}")]
    Rejected {
        mechanism: &'static str,
        target: String,
        message: String,
    },
    #[error("permission denied launching '{0}'")]
    PermissionDenied(String),
}

impl LaunchError {
    /// Not-found and rejected launches move on to the next mechanism;
    /// anything else ends the chain.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Rejected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMechanism {
    CommandPath,
    Resolved(CandidateSource),
    ShellStart,
    OpenDocument,
}

/// The OS launch mechanisms, in the order the controller tries them.
pub trait LaunchBackend: Send + Sync {
    fn find_on_path(&self, name: &str) -> Option<PathBuf>;
    fn spawn(&self, program: &Path) -> Result<(), LaunchError>;
    fn open_shortcut(&self, shortcut: &Path) -> Result<(), LaunchError>;
    fn shell_start(&self, name: &str) -> Result<(), LaunchError>;
    fn open_document(&self, target: &str) -> Result<(), LaunchError>;
}

pub struct SystemLaunchBackend {
    search_path: Vec<PathBuf>,
    shell_timeout: Duration,
}

impl SystemLaunchBackend {
    pub fn new(search_path: Vec<PathBuf>, shell_timeout: Duration) -> Self {
        Self {
            search_path,
            shell_timeout,
        }
    }
}

impl LaunchBackend for SystemLaunchBackend {
    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        find_command(name, &self.search_path)
    }

    fn spawn(&self, program: &Path) -> Result<(), LaunchError> {
        let target = program.to_string_lossy().into_owned();
        let child = Command::new(program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| classify_io("spawn", &target, error))?;
        reap_in_background(child);
        Ok(())
    }

    fn open_shortcut(&self, shortcut: &Path) -> Result<(), LaunchError> {
        platform::open_shortcut(shortcut, self.shell_timeout)
    }

    fn shell_start(&self, name: &str) -> Result<(), LaunchError> {
        platform::shell_start(name, self.shell_timeout)
    }

    fn open_document(&self, target: &str) -> Result<(), LaunchError> {
        platform::open_document(target, self.shell_timeout)
    }
}

fn classify_io(mechanism: &'static str, target: &str, error: io::Error) -> LaunchError {
    match error.kind() {
        io::ErrorKind::NotFound => LaunchError::NotFound(target.to_string()),
        io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied(target.to_string()),
        _ => LaunchError::Rejected {
            mechanism,
            target: target.to_string(),
            message: error.to_string(),
        },
    }
}

fn reap_in_background(mut child: std::process::Child) {
    std::thread::spawn(move || {
        let _ = child.wait();
    });
}

/// Runs a helper command to completion, killing it once `timeout` elapses.
fn run_helper(
    mechanism: &'static str,
    target: &str,
    command: &mut Command,
    timeout: Duration,
) -> Result<ExitStatus, LaunchError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|error| classify_io(mechanism, target, error))?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::Rejected {
                    mechanism,
                    target: target.to_string(),
                    message: format!("timed out after {timeout:?}"),
                });
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(25)),
            Err(error) => return Err(classify_io(mechanism, target, error)),
        }
    }
}

/// A helper that ran but exited non-zero could not find what it was asked
/// to start.
fn require_success(status: ExitStatus, target: &str) -> Result<(), LaunchError> {
    if status.success() {
        Ok(())
    } else {
        Err(LaunchError::NotFound(target.to_string()))
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use std::path::Path;
    use std::process::Command;
    use std::time::Duration;

    use super::{require_success, run_helper, LaunchError};

    pub fn open_shortcut(shortcut: &Path, _timeout: Duration) -> Result<(), LaunchError> {
        shell_execute_open("shortcut", &shortcut.to_string_lossy())
    }

    pub fn shell_start(name: &str, timeout: Duration) -> Result<(), LaunchError> {
        let script = format!("Start-Process '{}'", name.replace('\'', "''"));
        let status = run_helper(
            "Start-Process",
            name,
            Command::new("powershell").args([
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                script.as_str(),
            ]),
            timeout,
        )?;
        require_success(status, name)
    }

    pub fn open_document(target: &str, _timeout: Duration) -> Result<(), LaunchError> {
        shell_execute_open("ShellExecute", target)
    }

    fn shell_execute_open(mechanism: &'static str, target: &str) -> Result<(), LaunchError> {
        use windows_sys::Win32::UI::Shell::ShellExecuteW;
        use windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

        let verb = to_wide("open");
        let target_wide = to_wide(target);
        let result = unsafe {
            ShellExecuteW(
                std::ptr::null_mut(),
                verb.as_ptr(),
                target_wide.as_ptr(),
                std::ptr::null(),
                std::ptr::null(),
                SW_SHOWNORMAL,
            )
        } as isize;

        // ShellExecuteW reports failure as a value <= 32.
        match result {
            code if code > 32 => Ok(()),
            2 | 3 => Err(LaunchError::NotFound(target.to_string())),
            5 => Err(LaunchError::PermissionDenied(target.to_string())),
            code => Err(LaunchError::Rejected {
                mechanism,
                target: target.to_string(),
                message: format!("ShellExecuteW returned {code}"),
            }),
        }
    }

    fn to_wide(value: &str) -> Vec<u16> {
        value.encode_utf16().chain(std::iter::once(0)).collect()
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::path::Path;
    use std::process::Command;
    use std::time::Duration;

    use super::{require_success, run_helper, LaunchError};

    pub fn open_shortcut(shortcut: &Path, timeout: Duration) -> Result<(), LaunchError> {
        let target = shortcut.to_string_lossy();
        let status = run_helper("open", &target, Command::new("open").arg(shortcut), timeout)?;
        require_success(status, &target)
    }

    pub fn shell_start(name: &str, timeout: Duration) -> Result<(), LaunchError> {
        let status = run_helper("open -a", name, Command::new("open").args(["-a", name]), timeout)?;
        require_success(status, name)
    }

    pub fn open_document(target: &str, timeout: Duration) -> Result<(), LaunchError> {
        let status = run_helper("open", target, Command::new("open").arg(target), timeout)?;
        require_success(status, target)
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
mod platform {
    use std::path::Path;
    use std::process::{Command, Stdio};
    use std::time::Duration;

    use super::{classify_io, reap_in_background, require_success, run_helper, LaunchError};

    pub fn open_shortcut(shortcut: &Path, timeout: Duration) -> Result<(), LaunchError> {
        let target = shortcut.to_string_lossy();
        let status = run_helper(
            "gio launch",
            &target,
            Command::new("gio").arg("launch").arg(shortcut),
            timeout,
        )?;
        require_success(status, &target)
    }

    /// Desktop launchers conventionally install `Foo Bar` as `foo-bar`.
    pub fn shell_start(name: &str, _timeout: Duration) -> Result<(), LaunchError> {
        let program = name.trim().to_lowercase().replace(' ', "-");
        let child = Command::new(&program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| classify_io("shell start", &program, error))?;
        reap_in_background(child);
        Ok(())
    }

    pub fn open_document(target: &str, timeout: Duration) -> Result<(), LaunchError> {
        let status = run_helper("xdg-open", target, Command::new("xdg-open").arg(target), timeout)?;
        require_success(status, target)
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_io, LaunchBackend, LaunchError, SystemLaunchBackend};
    use std::io;
    use std::time::Duration;

    #[test]
    fn only_not_found_and_rejected_allow_fallback() {
        assert!(LaunchError::NotFound("x".into()).allows_fallback());
        assert!(LaunchError::Rejected {
            mechanism: "spawn",
            target: "x".into(),
            message: "bad".into(),
        }
        .allows_fallback());
        assert!(!LaunchError::PermissionDenied("x".into()).allows_fallback());
    }

    #[test]
    fn classifies_io_errors() {
        let missing = classify_io("spawn", "a", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing, LaunchError::NotFound("a".into()));

        let denied = classify_io("spawn", "a", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied, LaunchError::PermissionDenied("a".into()));

        let other = classify_io("spawn", "a", io::Error::from(io::ErrorKind::InvalidInput));
        assert!(matches!(other, LaunchError::Rejected { .. }));
    }

    #[test]
    fn spawning_missing_program_is_not_found() {
        let backend = SystemLaunchBackend::new(Vec::new(), Duration::from_secs(1));
        let missing = std::env::temp_dir()
            .join("appctl-launcher-test-missing")
            .join("nothing-here.exe");
        assert!(matches!(
            backend.spawn(&missing),
            Err(LaunchError::NotFound(_))
        ));
    }

    #[test]
    fn path_lookup_uses_configured_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tool.exe"), b"bin").unwrap();
        let backend =
            SystemLaunchBackend::new(vec![dir.path().to_path_buf()], Duration::from_secs(1));
        assert_eq!(
            backend.find_on_path("tool.exe"),
            Some(dir.path().join("tool.exe"))
        );
        assert_eq!(backend.find_on_path("other.exe"), None);
    }
}
