//! Filesystem helpers shared by the materializer, sync engine and writers
//!
//! Existence checks go through [`probe`] so callers branch on an explicit
//! tri-state instead of on errors from failed stats.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Kind of an existing filesystem entry (links are not followed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

#[derive(Debug)]
pub enum PathState {
    Present(EntryKind),
    Absent,
    Error(io::Error),
}

impl PathState {
    pub fn is_present(&self) -> bool {
        matches!(self, PathState::Present(_))
    }
}

/// Stat `path` without following symlinks
pub fn probe(path: &Path) -> PathState {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let ft = meta.file_type();
            let kind = if ft.is_symlink() {
                EntryKind::Symlink
            } else if ft.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            PathState::Present(kind)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => PathState::Absent,
        Err(e) => PathState::Error(e),
    }
}

/// Require a directory (or a link to one) at `path`
///
/// `Ok(false)` when nothing is there; an error for anything else.
pub fn require_dir(path: &Path) -> io::Result<bool> {
    match probe(path) {
        PathState::Present(EntryKind::Dir) => Ok(true),
        PathState::Present(EntryKind::Symlink) if path.is_dir() => Ok(true),
        PathState::Present(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", path.display()),
        )),
        PathState::Absent => Ok(false),
        PathState::Error(e) => Err(e),
    }
}

/// Remove whatever lives at `path`: file, symlink, junction or directory tree
///
/// Returns whether anything was removed. Symlinks are removed, never followed.
pub fn remove_any(path: &Path) -> io::Result<bool> {
    match probe(path) {
        PathState::Absent => Ok(false),
        PathState::Error(e) => Err(e),
        PathState::Present(EntryKind::Dir) => fs::remove_dir_all(path).map(|_| true),
        PathState::Present(EntryKind::File) => fs::remove_file(path).map(|_| true),
        PathState::Present(EntryKind::Symlink) => remove_link(path).map(|_| true),
    }
}

#[cfg(unix)]
fn remove_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link(path: &Path) -> io::Result<()> {
    // Directory symlinks and junctions are directories to the Win32 API
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

/// Create a link at `dest` pointing at directory `source`
#[cfg(unix)]
pub fn symlink_dir(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

/// Create a link at `dest` pointing at directory `source`
///
/// Symlinks need developer mode or elevation on Windows; junctions do not.
#[cfg(windows)]
pub fn symlink_dir(source: &Path, dest: &Path) -> io::Result<()> {
    if std::os::windows::fs::symlink_dir(source, dest).is_ok() {
        return Ok(());
    }

    let status = std::process::Command::new("cmd")
        .arg("/C")
        .arg("mklink")
        .arg("/J")
        .arg(dest)
        .arg(source)
        .stdout(std::process::Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "mklink /J {} failed",
            dest.display()
        )))
    }
}

#[cfg(unix)]
pub fn symlink_file(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

/// File links fall back to a plain copy when symlinks are not permitted
#[cfg(windows)]
pub fn symlink_file(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, dest).or_else(|_| fs::copy(source, dest).map(|_| ()))
}

/// Idempotently point `dest` at `source`, replacing any existing entry
pub fn replace_with_link(source: &Path, dest: &Path) -> io::Result<()> {
    remove_any(dest)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if source.is_dir() {
        symlink_dir(source, dest)
    } else {
        symlink_file(source, dest)
    }
}

/// Copy one file, creating parent directories
pub fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest).map(|_| ())
}

/// `path` relative to `root`, `/`-separated regardless of host style
pub fn relative_slash(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Pretty JSON with a trailing newline, the on-disk convention for every bkit file
pub fn to_json_pretty<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// A fully written temp file waiting to be renamed over its target
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temp file over the target
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Write `content` next to `target` without touching the target yet
pub fn stage_write(target: &Path, content: &[u8]) -> io::Result<StagedWrite> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp = target.with_file_name(temp_name);

    let staged = StagedWrite {
        temp,
        target: target.to_path_buf(),
        committed: false,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staged.temp)?;
    file.write_all(content)?;
    file.sync_all()?;

    Ok(staged)
}

/// Write-temp-then-rename
pub fn write_atomic(target: &Path, content: &[u8]) -> io::Result<()> {
    stage_write(target, content)?.commit()
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json<T: Serialize>(target: &Path, value: &T) -> io::Result<()> {
    let text = to_json_pretty(value).map_err(io::Error::other)?;
    write_atomic(target, text.as_bytes())
}

#[cfg(test)]
mod tests {
    include!("fsutil.test.rs");
}
