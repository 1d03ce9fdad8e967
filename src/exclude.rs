//! Append-only management of a working tree's `.git/info/exclude` file.
//!
//! Entries are never deduplicated: running a migration step twice appends the
//! same pattern twice, which git treats exactly like a single occurrence.
//!
//! A working tree's registry is only written by the thread that reserved that
//! tree for cloning, so appends need no locking of their own.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::trace;

use crate::error::Result;

/// Location of the exclude file inside a git working tree.
pub const EXCLUDE_FILE: &str = ".git/info/exclude";

/// Header written before the entries this tool adds on its own behalf.
pub const GIT_FILES_HEADER: &str = "# Git files";

/// Legacy ignore file svn never tracked and git should not start tracking.
pub const GITIGNORE_ENTRY: &str = ".gitignore";

/// The exclude registry of one working tree.
#[derive(Debug, Clone)]
pub struct ExcludeRegistry {
    path: PathBuf,
}

impl ExcludeRegistry {
    /// The registry of the working tree rooted at `repo_dir`.
    pub fn for_repository(repo_dir: &Path) -> Self {
        Self::at(repo_dir.join(EXCLUDE_FILE))
    }

    /// A registry backed by an arbitrary file.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as its own line, creating the file if absent.
    pub fn append(&self, entry: &str) -> Result<()> {
        self.append_lines(&[entry])
    }

    /// Appends several lines in a single write.
    pub fn append_lines(&self, lines: &[&str]) -> Result<()> {
        let mut text = String::new();
        for line in lines {
            text.push_str(line);
            if !line.ends_with('\n') {
                text.push('\n');
            }
        }
        self.write(&text)
    }

    /// Appends the ignore patterns `git svn` derived for a fresh clone,
    /// followed by a blank separator, the [`GIT_FILES_HEADER`] and the
    /// [`GITIGNORE_ENTRY`].
    pub fn append_converted_ignores(&self, svn_patterns: &str) -> Result<()> {
        self.append_lines(&[svn_patterns, "", GIT_FILES_HEADER, GITIGNORE_ENTRY])
    }

    fn write(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;

        trace!("Appended {} bytes to {}", text.len(), self.path.display());
        Ok(())
    }
}
