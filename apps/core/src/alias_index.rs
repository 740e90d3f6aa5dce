use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::command_path::{find_command, is_bare_command};
use crate::model::{normalize_name, Query};

/// How a curated alias names its launch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    /// A concrete path, or a bare command name looked up on the search path.
    Literal(String),
    /// A path containing `%VAR%` references expanded at lookup time.
    EnvTemplate(String),
    /// A glob pattern (optionally with `%VAR%` references); the
    /// lexicographically-last match wins.
    Glob(String),
}

impl AliasTarget {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains(['*', '?', '[']) {
            Self::Glob(raw.to_string())
        } else if raw.contains('%') {
            Self::EnvTemplate(raw.to_string())
        } else {
            Self::Literal(raw.to_string())
        }
    }
}

/// Immutable alias configuration: launch targets plus the process image
/// names each application is known to run as.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    targets: HashMap<String, AliasTarget>,
    process_names: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, name: &str, target: &str) -> Self {
        self.targets
            .insert(normalize_name(name), AliasTarget::parse(target));
        self
    }

    pub fn with_process_names(mut self, name: &str, images: &[&str]) -> Self {
        self.process_names.insert(
            normalize_name(name),
            images.iter().map(|image| image.to_string()).collect(),
        );
        self
    }

    pub fn target(&self, query: &Query) -> Option<&AliasTarget> {
        self.targets.get(query.as_str())
    }

    pub fn process_names(&self, query: &Query) -> &[String] {
        self.process_names
            .get(query.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The compiled-in table for the current platform.
    pub fn builtin() -> Self {
        builtin_entries()
            .iter()
            .fold(Self::new(), |table, (name, target)| {
                table.with_alias(name, target)
            })
            .with_builtin_process_names()
    }

    fn with_builtin_process_names(self) -> Self {
        builtin_process_names()
            .iter()
            .fold(self, |table, (name, images)| {
                table.with_process_names(name, images)
            })
    }
}

pub struct AliasIndex {
    table: AliasTable,
    search_path: Vec<PathBuf>,
}

impl AliasIndex {
    pub fn new(table: AliasTable, search_path: Vec<PathBuf>) -> Self {
        Self { table, search_path }
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// Resolves the alias for `query` to an existing target. Bare command
    /// names are returned verbatim once found on the search path.
    pub fn lookup(&self, query: &Query) -> Option<PathBuf> {
        let target = self.table.target(query)?;
        let resolved = match target {
            AliasTarget::Literal(path) => self.existing_literal(path),
            AliasTarget::EnvTemplate(template) => {
                let expanded = expand_env_template(template)?;
                self.existing_literal(&expanded)
            }
            AliasTarget::Glob(pattern) => {
                let expanded = expand_env_template(pattern)?;
                last_glob_match(&expanded)
            }
        };

        match &resolved {
            Some(path) => log::debug!("alias hit for '{query}': {}", path.display()),
            None => log::debug!("alias for '{query}' does not resolve on this host"),
        }
        resolved
    }

    fn existing_literal(&self, literal: &str) -> Option<PathBuf> {
        if is_bare_command(literal) {
            return find_command(literal, &self.search_path).map(|_| PathBuf::from(literal));
        }
        let path = Path::new(literal);
        path.exists().then(|| path.to_path_buf())
    }
}

/// Expands `%NAME%` references from the process environment. Returns
/// `None` when a referenced variable is unset or the template is malformed.
pub fn expand_env_template(template: &str) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('%')?;
        let name = &after[..end];
        if name.is_empty() {
            out.push('%');
        } else {
            let value = std::env::var_os(name)?;
            out.push_str(&value.to_string_lossy());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Some(out)
}

fn last_glob_match(pattern: &str) -> Option<PathBuf> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(error) => {
            log::warn!("invalid alias glob '{pattern}': {error}");
            return None;
        }
    };

    let mut matches: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    matches.sort();
    matches.pop()
}

#[cfg(target_os = "windows")]
fn builtin_entries() -> &'static [(&'static str, &'static str)] {
    &[
        ("chrome", r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
        ("google chrome", r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
        ("firefox", r"C:\Program Files\Mozilla Firefox\firefox.exe"),
        ("edge", r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"),
        ("microsoft edge", r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"),
        ("brave", r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe"),
        ("opera", r"%LOCALAPPDATA%\Programs\Opera\launcher.exe"),
        ("notepad", "notepad.exe"),
        ("wordpad", "wordpad.exe"),
        ("word", r"C:\Program Files\Microsoft Office\root\Office*\WINWORD.EXE"),
        ("excel", r"C:\Program Files\Microsoft Office\root\Office*\EXCEL.EXE"),
        ("powerpoint", r"C:\Program Files\Microsoft Office\root\Office*\POWERPNT.EXE"),
        ("outlook", r"C:\Program Files\Microsoft Office\root\Office*\OUTLOOK.EXE"),
        ("onenote", r"C:\Program Files\Microsoft Office\root\Office*\ONENOTE.EXE"),
        ("teams", r"%LOCALAPPDATA%\Microsoft\Teams\current\Teams.exe"),
        ("calculator", "calc.exe"),
        ("paint", "mspaint.exe"),
        ("snipping tool", "SnippingTool.exe"),
        ("task manager", "taskmgr.exe"),
        ("file explorer", "explorer.exe"),
        ("explorer", "explorer.exe"),
        ("control panel", "control.exe"),
        ("device manager", "devmgmt.msc"),
        ("registry editor", "regedit.exe"),
        ("command prompt", "cmd.exe"),
        ("cmd", "cmd.exe"),
        ("powershell", "powershell.exe"),
        ("terminal", "wt.exe"),
        ("windows terminal", "wt.exe"),
        ("vlc", r"C:\Program Files\VideoLAN\VLC\vlc.exe"),
        ("spotify", r"%APPDATA%\Spotify\Spotify.exe"),
        ("itunes", r"C:\Program Files\iTunes\iTunes.exe"),
        ("windows media player", "wmplayer.exe"),
        ("vs code", r"%LOCALAPPDATA%\Programs\Microsoft VS Code\Code.exe"),
        ("vscode", r"%LOCALAPPDATA%\Programs\Microsoft VS Code\Code.exe"),
        ("visual studio code", r"%LOCALAPPDATA%\Programs\Microsoft VS Code\Code.exe"),
        (
            "visual studio",
            r"C:\Program Files\Microsoft Visual Studio\*\Community\Common7\IDE\devenv.exe",
        ),
        ("pycharm", r"C:\Program Files\JetBrains\PyCharm Community Edition*\bin\pycharm64.exe"),
        ("android studio", r"C:\Program Files\Android\Android Studio\bin\studio64.exe"),
        ("git bash", r"C:\Program Files\Git\git-bash.exe"),
        ("discord", r"%LOCALAPPDATA%\Discord\Update.exe"),
        ("slack", r"%LOCALAPPDATA%\slack\slack.exe"),
        ("zoom", r"%APPDATA%\Zoom\bin\Zoom.exe"),
        ("skype", r"%APPDATA%\Microsoft\Skype for Desktop\Skype.exe"),
        ("whatsapp", r"%LOCALAPPDATA%\WhatsApp\WhatsApp.exe"),
        ("telegram", r"%APPDATA%\Telegram Desktop\Telegram.exe"),
        ("steam", r"C:\Program Files (x86)\Steam\steam.exe"),
        (
            "epic games",
            r"%LOCALAPPDATA%\EpicGamesLauncher\Portal\Binaries\Win64\EpicGamesLauncher.exe",
        ),
        ("obs", r"C:\Program Files\obs-studio\bin\64bit\obs64.exe"),
        ("obs studio", r"C:\Program Files\obs-studio\bin\64bit\obs64.exe"),
        ("photoshop", r"C:\Program Files\Adobe\Adobe Photoshop *\Photoshop.exe"),
        ("adobe photoshop", r"C:\Program Files\Adobe\Adobe Photoshop *\Photoshop.exe"),
        ("premiere", r"C:\Program Files\Adobe\Adobe Premiere Pro *\Adobe Premiere Pro.exe"),
        (
            "after effects",
            r"C:\Program Files\Adobe\Adobe After Effects *\Support Files\AfterFX.exe",
        ),
        (
            "illustrator",
            r"C:\Program Files\Adobe\Adobe Illustrator *\Support Files\Contents\Windows\Illustrator.exe",
        ),
        ("blender", r"C:\Program Files\Blender Foundation\Blender *\blender.exe"),
        ("minecraft", r"%APPDATA%\.minecraft\MinecraftLauncher.exe"),
        ("notepad++", r"C:\Program Files\Notepad++\notepad++.exe"),
        ("7zip", r"C:\Program Files\7-Zip\7zFM.exe"),
        ("winrar", r"C:\Program Files\WinRAR\WinRAR.exe"),
        ("putty", r"C:\Program Files\PuTTY\putty.exe"),
        ("filezilla", r"C:\Program Files\FileZilla FTP Client\filezilla.exe"),
    ]
}

#[cfg(target_os = "windows")]
fn builtin_process_names() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("chrome", &["chrome.exe"]),
        ("google chrome", &["chrome.exe"]),
        ("firefox", &["firefox.exe"]),
        ("edge", &["msedge.exe"]),
        ("microsoft edge", &["msedge.exe"]),
        ("brave", &["brave.exe"]),
        ("notepad", &["notepad.exe"]),
        ("word", &["WINWORD.EXE"]),
        ("excel", &["EXCEL.EXE"]),
        ("powerpoint", &["POWERPNT.EXE"]),
        ("outlook", &["OUTLOOK.EXE"]),
        ("teams", &["Teams.exe", "ms-teams.exe"]),
        ("calculator", &["CalculatorApp.exe", "calc.exe"]),
        ("paint", &["mspaint.exe"]),
        ("task manager", &["Taskmgr.exe"]),
        ("spotify", &["Spotify.exe"]),
        ("vlc", &["vlc.exe"]),
        ("discord", &["Discord.exe"]),
        ("slack", &["slack.exe"]),
        ("zoom", &["Zoom.exe"]),
        ("skype", &["Skype.exe"]),
        ("whatsapp", &["WhatsApp.exe"]),
        ("telegram", &["Telegram.exe"]),
        ("steam", &["steam.exe"]),
        ("obs", &["obs64.exe", "obs32.exe", "obs.exe"]),
        ("obs studio", &["obs64.exe"]),
        ("photoshop", &["Photoshop.exe"]),
        ("blender", &["blender.exe"]),
        ("vs code", &["Code.exe"]),
        ("vscode", &["Code.exe"]),
        ("visual studio code", &["Code.exe"]),
        ("visual studio", &["devenv.exe"]),
        ("pycharm", &["pycharm64.exe"]),
        ("notepad++", &["notepad++.exe"]),
        ("epic games", &["EpicGamesLauncher.exe"]),
    ]
}

#[cfg(not(target_os = "windows"))]
fn builtin_entries() -> &'static [(&'static str, &'static str)] {
    &[
        ("calculator", "gnome-calculator"),
        ("terminal", "gnome-terminal"),
        ("file explorer", "nautilus"),
        ("files", "nautilus"),
        ("text editor", "gedit"),
        ("chrome", "google-chrome"),
        ("google chrome", "google-chrome"),
        ("chromium", "chromium"),
        ("firefox", "firefox"),
        ("vs code", "code"),
        ("vscode", "code"),
        ("visual studio code", "code"),
        ("vlc", "vlc"),
        ("spotify", "spotify"),
        ("discord", "discord"),
        ("slack", "slack"),
        ("telegram", "telegram-desktop"),
        ("obs", "obs"),
        ("obs studio", "obs"),
        ("blender", "blender"),
        ("steam", "steam"),
    ]
}

#[cfg(not(target_os = "windows"))]
fn builtin_process_names() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("calculator", &["gnome-calculator"]),
        ("terminal", &["gnome-terminal-server", "gnome-terminal"]),
        ("file explorer", &["nautilus"]),
        ("chrome", &["chrome", "google-chrome"]),
        ("google chrome", &["chrome", "google-chrome"]),
        ("vs code", &["code"]),
        ("vscode", &["code"]),
        ("visual studio code", &["code"]),
        ("telegram", &["telegram-desktop"]),
        ("obs", &["obs"]),
        ("obs studio", &["obs"]),
    ]
}
