use std::fs;
use std::path::{Path, PathBuf};

use crate::command_path::is_executable_file;
use crate::discovery::{DiscoveryProvider, SkipReason, SourceResult};
use crate::model::{
    file_stem_lower, has_extension, normalize_name, score_name, Candidate, CandidateSource, Query,
};

/// One installed-software record as advertised by the OS package registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageEntry {
    pub display_name: String,
    pub install_location: Option<String>,
    pub display_icon: Option<String>,
}

pub trait PackageSource: Send + Sync {
    fn entries(&self) -> Result<Vec<PackageEntry>, SkipReason>;
}

/// Entries supplied up front rather than read from the OS.
pub struct FixedPackageSource {
    entries: Vec<PackageEntry>,
}

impl FixedPackageSource {
    pub fn new(entries: Vec<PackageEntry>) -> Self {
        Self { entries }
    }
}

impl PackageSource for FixedPackageSource {
    fn entries(&self) -> Result<Vec<PackageEntry>, SkipReason> {
        Ok(self.entries.clone())
    }
}

pub struct SystemPackageIndex {
    source: Box<dyn PackageSource>,
}

impl SystemPackageIndex {
    pub fn new(source: Box<dyn PackageSource>) -> Self {
        Self { source }
    }

    /// Reads the host's registry where one exists.
    pub fn system() -> Self {
        Self::new(Box::new(RegistryPackageSource))
    }
}

impl DiscoveryProvider for SystemPackageIndex {
    fn provider_name(&self) -> &'static str {
        "registry"
    }

    fn search(&self, query: &Query) -> SourceResult {
        let entries = match self.source.entries() {
            Ok(entries) => entries,
            Err(reason) => return SourceResult::Skipped(reason),
        };

        let candidates = entries
            .iter()
            .flat_map(|entry| candidates_for_entry(query, entry))
            .collect();
        SourceResult::Found(candidates)
    }
}

/// Derives executable candidates from one registry entry: matching
/// executables directly inside its install directory, and its display icon
/// when that points at an existing executable.
pub fn candidates_for_entry(query: &Query, entry: &PackageEntry) -> Vec<Candidate> {
    let score = score_name(query.as_str(), &normalize_name(&entry.display_name));
    if !score.is_match() {
        return Vec::new();
    }

    let mut out = Vec::new();
    if let Some(location) = entry.install_location.as_deref() {
        for path in executables_in_install_dir(Path::new(location.trim()), query) {
            out.extend(Candidate::scored(score, path, CandidateSource::Registry));
        }
    }

    if let Some(icon) = entry.display_icon.as_deref().and_then(parse_icon_reference) {
        if has_extension(&icon, &["exe"]) && icon.is_file() {
            out.extend(Candidate::scored(score, icon, CandidateSource::Registry));
        }
    }

    out
}

fn executables_in_install_dir(dir: &Path, query: &Query) -> Vec<PathBuf> {
    if dir.as_os_str().is_empty() || !dir.is_dir() {
        return Vec::new();
    }
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(error) => {
            log::debug!("cannot list install dir {}: {error}", dir.display());
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = listing
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| has_extension(path, &["exe"]) && is_executable_file(path))
        .filter(|path| {
            file_stem_lower(path)
                .map(|stem| score_name(query.as_str(), &stem).is_match())
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

/// `"C:\App\app.exe",0` → `C:\App\app.exe`.
pub fn parse_icon_reference(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    let without_index = match trimmed.rsplit_once(',') {
        Some((path, index)) if is_icon_index(index) => path,
        _ => trimmed,
    };
    let unquoted = without_index.trim().trim_matches('"').trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}

fn is_icon_index(raw: &str) -> bool {
    raw.trim()
        .trim_start_matches('-')
        .chars()
        .all(|c| c.is_ascii_digit())
}

/// The Windows `Uninstall` keys; other platforms have no equivalent.
pub struct RegistryPackageSource;

#[cfg(not(target_os = "windows"))]
impl PackageSource for RegistryPackageSource {
    fn entries(&self) -> Result<Vec<PackageEntry>, SkipReason> {
        Err(SkipReason::UnsupportedPlatform)
    }
}

#[cfg(target_os = "windows")]
impl PackageSource for RegistryPackageSource {
    fn entries(&self) -> Result<Vec<PackageEntry>, SkipReason> {
        use windows_sys::Win32::System::Registry::{
            HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_WOW64_32KEY,
        };

        let mut entries = Vec::new();
        let mut failures = Vec::new();
        let hives = [
            ("hklm", HKEY_LOCAL_MACHINE, 0),
            ("hklm32", HKEY_LOCAL_MACHINE, KEY_WOW64_32KEY),
            ("hkcu", HKEY_CURRENT_USER, 0),
        ];
        for (label, root, view_flags) in hives {
            let collected =
                collect_entries_from_uninstall_key(label, root, view_flags, &mut entries);
            if let Err(error) = collected {
                log::warn!("skipping registry hive {label}: {error}");
                failures.push(error);
            }
        }

        if entries.is_empty() && failures.len() == hives.len() {
            return Err(SkipReason::PermissionDenied(failures.join("; ")));
        }
        Ok(entries)
    }
}

#[cfg(target_os = "windows")]
fn collect_entries_from_uninstall_key(
    hive_label: &str,
    root: windows_sys::Win32::System::Registry::HKEY,
    view_flags: u32,
    out: &mut Vec<PackageEntry>,
) -> Result<(), String> {
    use windows_sys::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS};
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegEnumKeyExW, RegOpenKeyExW, RegQueryInfoKeyW, HKEY, KEY_READ,
    };

    const UNINSTALL_SUBKEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Uninstall";

    let mut uninstall_root: HKEY = std::ptr::null_mut();
    let subkey_wide = to_wide(UNINSTALL_SUBKEY);
    let open_status = unsafe {
        RegOpenKeyExW(
            root,
            subkey_wide.as_ptr(),
            0,
            KEY_READ | view_flags,
            &mut uninstall_root,
        )
    };
    if open_status == ERROR_FILE_NOT_FOUND {
        return Ok(());
    }
    if open_status != ERROR_SUCCESS {
        return Err(format!("open uninstall key ({hive_label}) failed with code {open_status}"));
    }

    let mut subkey_count = 0_u32;
    let mut max_subkey_len = 0_u32;
    let info_status = unsafe {
        RegQueryInfoKeyW(
            uninstall_root,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            &mut subkey_count,
            &mut max_subkey_len,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if info_status != ERROR_SUCCESS {
        unsafe {
            RegCloseKey(uninstall_root);
        }
        return Err(format!("inspect uninstall key ({hive_label}) failed with code {info_status}"));
    }

    let mut name_buffer = vec![0_u16; max_subkey_len as usize + 2];
    for index in 0..subkey_count {
        let mut name_len = max_subkey_len + 1;
        let enum_status = unsafe {
            RegEnumKeyExW(
                uninstall_root,
                index,
                name_buffer.as_mut_ptr(),
                &mut name_len,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if enum_status == ERROR_NO_MORE_ITEMS {
            break;
        }
        if enum_status != ERROR_SUCCESS {
            continue;
        }

        let subkey_name = String::from_utf16_lossy(&name_buffer[..name_len as usize]);
        if let Some(entry) = read_package_entry(uninstall_root, view_flags, &subkey_name) {
            out.push(entry);
        }
    }

    unsafe {
        RegCloseKey(uninstall_root);
    }
    Ok(())
}

/// Unreadable entries yield `None` so one locked key never aborts the scan.
#[cfg(target_os = "windows")]
fn read_package_entry(
    uninstall_root: windows_sys::Win32::System::Registry::HKEY,
    view_flags: u32,
    subkey_name: &str,
) -> Option<PackageEntry> {
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{RegCloseKey, RegOpenKeyExW, HKEY, KEY_READ};

    let subkey_wide = to_wide(subkey_name);
    let mut app_key: HKEY = std::ptr::null_mut();
    let open_status = unsafe {
        RegOpenKeyExW(
            uninstall_root,
            subkey_wide.as_ptr(),
            0,
            KEY_READ | view_flags,
            &mut app_key,
        )
    };
    if open_status != ERROR_SUCCESS {
        return None;
    }

    let display_name = read_reg_string_value(app_key, "DisplayName");
    let install_location = read_reg_string_value(app_key, "InstallLocation");
    let display_icon = read_reg_string_value(app_key, "DisplayIcon");
    unsafe {
        RegCloseKey(app_key);
    }

    let display_name = display_name?;
    Some(PackageEntry {
        display_name,
        install_location,
        display_icon,
    })
}

#[cfg(target_os = "windows")]
fn read_reg_string_value(
    key: windows_sys::Win32::System::Registry::HKEY,
    value_name: &str,
) -> Option<String> {
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{RegQueryValueExW, REG_EXPAND_SZ, REG_SZ};

    let value_name_wide = to_wide(value_name);
    let mut value_type = 0_u32;
    let mut size = 0_u32;
    let query_status = unsafe {
        RegQueryValueExW(
            key,
            value_name_wide.as_ptr(),
            std::ptr::null(),
            &mut value_type,
            std::ptr::null_mut(),
            &mut size,
        )
    };
    if query_status != ERROR_SUCCESS || size == 0 {
        return None;
    }
    if value_type != REG_SZ && value_type != REG_EXPAND_SZ {
        return None;
    }

    let mut buffer = vec![0_u8; size as usize];
    let read_status = unsafe {
        RegQueryValueExW(
            key,
            value_name_wide.as_ptr(),
            std::ptr::null(),
            &mut value_type,
            buffer.as_mut_ptr(),
            &mut size,
        )
    };
    if read_status != ERROR_SUCCESS {
        return None;
    }

    let mut wide: Vec<u16> = buffer
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    while wide.last().copied() == Some(0) {
        wide.pop();
    }
    let mut value = String::from_utf16_lossy(&wide).trim().to_string();
    if value_type == REG_EXPAND_SZ {
        value = expand_environment_strings(&value);
    }

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(target_os = "windows")]
fn expand_environment_strings(input: &str) -> String {
    use windows_sys::Win32::System::Environment::ExpandEnvironmentStringsW;

    if !input.contains('%') {
        return input.to_string();
    }

    let input_wide = to_wide(input);
    let needed = unsafe { ExpandEnvironmentStringsW(input_wide.as_ptr(), std::ptr::null_mut(), 0) };
    if needed == 0 {
        return input.to_string();
    }

    let mut output = vec![0_u16; needed as usize];
    let written =
        unsafe { ExpandEnvironmentStringsW(input_wide.as_ptr(), output.as_mut_ptr(), needed) };
    if written == 0 {
        return input.to_string();
    }

    while output.last().copied() == Some(0) {
        output.pop();
    }
    String::from_utf16_lossy(&output)
}

#[cfg(target_os = "windows")]
fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}
