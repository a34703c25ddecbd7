//! Pack content and archive helpers for E2E tests

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Write a few representative pack files and return their project-relative paths
pub fn write_pack_content(project_dir: &Path) -> Result<Vec<PathBuf>> {
    let files = [
        (
            "packs/behavior/items/ruby.json",
            r#"{"format_version":"1.21.0","minecraft:item":{"description":{"identifier":"demo:ruby"}}}"#,
        ),
        (
            "packs/resource/texts/en_US.lang",
            "item.demo:ruby.name=Ruby\n",
        ),
        ("packs/resource/textures/items/ruby.png", "png"),
        ("packs/behavior/notes.log", "scratch\n"),
    ];

    let mut written = Vec::new();
    for (relative, content) in files {
        let path = project_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        written.push(PathBuf::from(relative));
    }
    Ok(written)
}

/// Sorted entry names of a zip archive
pub fn archive_entries(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let archive = zip::ZipArchive::new(file)?;
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}
