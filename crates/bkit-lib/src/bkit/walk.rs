//! Generic directory walk with a per-entry visit decision
//!
//! One traversal serves copy, TypeScript detection, symlink collection and
//! project discovery. When links are followed, directories are tracked by
//! canonical path so link cycles end the branch instead of looping.

use super::fsutil::EntryKind;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What to do with an entry handed to the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep walking (into it, for directories) without recording it
    Descend,
    /// Record it and keep walking
    Collect,
    /// Neither record nor enter it
    Skip,
    /// Stop the whole walk after recording nothing further
    Halt,
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub follow_links: bool,
    pub max_depth: Option<usize>,
}

impl WalkOptions {
    pub fn following_links() -> Self {
        Self {
            follow_links: true,
            ..Self::default()
        }
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// An entry below the walk root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the walk root
    pub relative: PathBuf,
    pub depth: usize,
    pub kind: EntryKind,
}

impl WalkEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Walk everything below `root` in file-name order, collecting what `visit` asks for
///
/// The root itself is never visited.
pub fn walk<F>(root: &Path, options: &WalkOptions, mut visit: F) -> io::Result<Vec<WalkEntry>>
where
    F: FnMut(&WalkEntry) -> Visit,
{
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_links)
        .sort_by_file_name();
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
    if options.follow_links {
        seen_dirs.insert(root.canonicalize()?);
    }

    let mut collected = Vec::new();
    let mut iter = walker.into_iter();

    while let Some(next) = iter.next() {
        let dirent = match next {
            Ok(dirent) => dirent,
            Err(e) if e.loop_ancestor().is_some() => {
                tracing::debug!(error = %e, "Skipping symlink cycle");
                continue;
            }
            Err(e) => {
                // A dangling link is not worth aborting the walk over
                if e.path().is_some_and(|p| p.symlink_metadata().is_ok() && !p.exists()) {
                    tracing::debug!(error = %e, "Skipping dangling symlink");
                    continue;
                }
                return Err(e.into());
            }
        };

        let ft = dirent.file_type();
        let kind = if dirent.path_is_symlink() && !options.follow_links {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        if kind == EntryKind::Dir && options.follow_links && dirent.path_is_symlink() {
            let real = dirent.path().canonicalize()?;
            if !seen_dirs.insert(real) {
                tracing::debug!(path = %dirent.path().display(), "Directory already visited through another link");
                iter.skip_current_dir();
                continue;
            }
        }

        let entry = WalkEntry {
            path: dirent.path().to_path_buf(),
            relative: dirent
                .path()
                .strip_prefix(root)
                .unwrap_or(dirent.path())
                .to_path_buf(),
            depth: dirent.depth(),
            kind,
        };

        match visit(&entry) {
            Visit::Descend => {}
            Visit::Collect => collected.push(entry),
            Visit::Skip => {
                if kind == EntryKind::Dir {
                    iter.skip_current_dir();
                }
            }
            Visit::Halt => break,
        }
    }

    Ok(collected)
}

/// Whether any file below `root` satisfies `predicate`; stops at the first hit
pub fn any_file<F>(root: &Path, options: &WalkOptions, mut predicate: F) -> io::Result<bool>
where
    F: FnMut(&WalkEntry) -> bool,
{
    let mut found = false;
    walk(root, options, |entry| {
        if entry.kind != EntryKind::Dir && predicate(entry) {
            found = true;
            Visit::Halt
        } else {
            Visit::Descend
        }
    })?;
    Ok(found)
}

/// Every symlink below `root`, links themselves not followed
pub fn collect_symlinks(root: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(walk(root, &WalkOptions::default(), |entry| match entry.kind {
        EntryKind::Symlink => Visit::Collect,
        _ => Visit::Descend,
    })?
    .into_iter()
    .map(|e| e.path)
    .collect())
}

#[cfg(test)]
mod tests {
    include!("walk.test.rs");
}
