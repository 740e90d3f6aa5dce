use std::fs;
use std::path::{Component, Path, PathBuf};

#[cfg(target_os = "windows")]
const COMMAND_SUFFIXES: &[&str] = &["exe", "com", "bat", "cmd"];
#[cfg(not(target_os = "windows"))]
const COMMAND_SUFFIXES: &[&str] = &[];

pub const EXECUTABLE_EXTENSIONS: &[&str] = &["exe"];

/// `true` when the input names a program rather than a location: a single
/// normal path component such as `calc.exe` or `firefox`.
pub fn is_bare_command(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    let mut components = Path::new(trimmed).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Looks the command up in `dirs` the way a shell would: the literal name
/// first, then with each platform command suffix when the name has none.
pub fn find_command(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let trimmed = name.trim();
    if !is_bare_command(trimmed) {
        return None;
    }

    let has_extension = Path::new(trimmed).extension().is_some();
    for dir in dirs {
        let direct = dir.join(trimmed);
        if is_executable_file(&direct) {
            return Some(direct);
        }
        if has_extension {
            continue;
        }
        for suffix in COMMAND_SUFFIXES {
            let with_suffix = dir.join(format!("{trimmed}.{suffix}"));
            if is_executable_file(&with_suffix) {
                return Some(with_suffix);
            }
        }
    }

    None
}

/// A regular file that is an `.exe`, or on Unix carries an execute bit.
pub fn is_executable_file(path: &Path) -> bool {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return false,
    };
    if !meta.is_file() {
        return false;
    }
    if crate::model::has_extension(path, EXECUTABLE_EXTENSIONS) {
        return true;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        crate::model::has_extension(path, COMMAND_SUFFIXES)
    }
}

#[cfg(test)]
mod tests {
    use super::{find_command, is_bare_command, is_executable_file};

    #[test]
    fn bare_command_detection() {
        assert!(is_bare_command("calc.exe"));
        assert!(is_bare_command("firefox"));
        assert!(!is_bare_command("bin/firefox"));
        assert!(!is_bare_command("/usr/bin/firefox"));
        assert!(!is_bare_command(".."));
        assert!(!is_bare_command("  "));
    }

    #[test]
    fn finds_command_in_listed_directories_only() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let target = second.path().join("calc.exe");
        std::fs::write(&target, b"bin").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_command("calc.exe", &dirs), Some(target));
        assert_eq!(find_command("calc.exe", &dirs[..1]), None);
    }

    #[test]
    fn directories_are_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tool.exe");
        std::fs::create_dir(&nested).unwrap();
        assert!(!is_executable_file(&nested));
    }
}
