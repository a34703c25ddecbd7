//! `.bkitignore` compilation and matching
//!
//! Patterns are gitignore-flavoured: `**` spans directories, `*` and `?` stay
//! within one segment, a leading `/` anchors at the project root and anything
//! else matches at any depth. A pattern that names a directory also covers
//! everything below it.

use super::fsutil;
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;

pub const IGNORE_FILE: &str = ".bkitignore";

/// Patterns longer than this are dropped
pub const MAX_PATTERN_LEN: usize = 1000;
/// Rules beyond this count are dropped
pub const MAX_RULES: usize = 1000;
/// Ignore files larger than this are not read at all
pub const MAX_FILE_BYTES: u64 = 1024 * 1024;
/// This many consecutive wildcards reject a pattern
const MAX_WILDCARD_RUN: usize = 5;

#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: String,
    regex: Regex,
}

impl IgnoreRule {
    pub fn matches(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }
}

/// Compiled rule set for one project
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    rules: Vec<IgnoreRule>,
}

impl IgnoreFilter {
    /// Compile pattern lines; bad patterns are logged and skipped, never fatal
    pub fn compile(source: &str) -> Self {
        let mut rules = Vec::new();

        for line in source.lines() {
            let pattern = line.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }

            if rules.len() >= MAX_RULES {
                tracing::warn!(limit = MAX_RULES, "Ignore rule limit reached, dropping remaining patterns");
                break;
            }

            if pattern.len() > MAX_PATTERN_LEN {
                tracing::warn!(length = pattern.len(), "Skipping overlong ignore pattern");
                continue;
            }

            if longest_wildcard_run(pattern) >= MAX_WILDCARD_RUN {
                tracing::warn!(pattern, "Skipping ignore pattern with too many consecutive wildcards");
                continue;
            }

            match Regex::new(&pattern_to_regex(pattern)) {
                Ok(regex) => rules.push(IgnoreRule {
                    pattern: pattern.to_string(),
                    regex,
                }),
                Err(e) => tracing::warn!(pattern, error = %e, "Skipping invalid ignore pattern"),
            }
        }

        Self { rules }
    }

    /// Load `<project>/.bkitignore`; a missing file means no rules
    pub fn load(project_root: &Path) -> io::Result<Self> {
        let path = project_root.join(IGNORE_FILE);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };

        if meta.len() > MAX_FILE_BYTES {
            tracing::warn!(
                path = %path.display(),
                bytes = meta.len(),
                "Ignore file too large, ignoring all of its patterns"
            );
            return Ok(Self::default());
        }

        Ok(Self::compile(&fs::read_to_string(&path)?))
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match a `/`-separated path relative to the project root
    pub fn is_ignored_relative(&self, relative: &str) -> bool {
        !relative.is_empty() && self.rules.iter().any(|rule| rule.matches(relative))
    }

    /// Match an absolute path; paths outside `root` are never ignored
    pub fn is_ignored(&self, path: &Path, root: &Path) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        fsutil::relative_slash(path, root)
            .is_some_and(|relative| self.is_ignored_relative(&relative))
    }
}

fn longest_wildcard_run(pattern: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in pattern.chars() {
        if c == '*' || c == '?' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn pattern_to_regex(pattern: &str) -> String {
    let (anchored, body) = match pattern.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let body = body.trim_end_matches('/');

    let mut regex = String::with_capacity(body.len() * 2 + 16);
    regex.push('^');
    if !anchored {
        regex.push_str("(?:.*/)?");
    }

    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    regex.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    regex.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                regex.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                regex.push_str("[^/]");
                i += 1;
            }
            c => {
                let mut buf = [0u8; 4];
                regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    regex.push_str("(?:/.*)?$");
    regex
}

#[cfg(test)]
mod tests {
    include!("ignore.test.rs");
}
