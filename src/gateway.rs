//! # Version-Control Gateway
//!
//! This module defines the narrow interface the migration needs from the
//! Subversion and git command-line clients, and the default implementation
//! that shells out to them.
//!
//! ## Design
//!
//! Every version-control operation is an opaque process invocation returning
//! raw text. The `VersionControl` trait isolates those invocations, so the
//! positional text parsing (revision numbers, externals blocks, empty-dir
//! warnings) can be exercised with canned fixtures and the orchestrator can be
//! tested with a mock that records calls instead of running `svn` or `git`.
//!
//! In the application `DefaultVersionControl` is used, which runs the
//! executables named in a `GatewayConfig`.

use std::ffi::OsString;
use std::path::Path;

use log::warn;

use crate::error::Result;

/// Trait for version-control operations - allows mocking in tests
pub trait VersionControl: Send + Sync {
    /// Returns the identifier of the newest revision of `url`.
    fn resolve_latest_revision(&self, url: &str) -> Result<String>;

    /// Performs a full-history clone of `url` into `target_dir`, stopping at
    /// `revision` when given, and returns the tool's raw output.
    fn clone_with_history(
        &self,
        url: &str,
        target_dir: &Path,
        revision: Option<&str>,
    ) -> Result<String>;

    /// Returns the raw `svn:externals` listing for `url`, including nested
    /// paths when `recursive` is set.
    fn list_externals(&self, url: &str, recursive: bool) -> Result<String>;

    /// Returns the ignore patterns the converted tree at `repo_dir` inherits
    /// from `svn:ignore`.
    fn list_ignore_patterns(&self, repo_dir: &Path) -> Result<String>;

    /// Creates and switches to `name` in the working tree at `repo_dir`.
    ///
    /// Never fails: an existing branch (or any other refusal) is not
    /// distinguished from success.
    fn create_branch(&self, repo_dir: &Path, name: &str);
}

/// Which executables the default gateway runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub git_program: OsString,
    pub svn_program: OsString,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            git_program: OsString::from("git"),
            svn_program: OsString::from("svn"),
        }
    }
}

/// The default implementation of `VersionControl`, which runs the system's
/// `svn` and `git` commands.
#[derive(Debug, Clone, Default)]
pub struct DefaultVersionControl {
    config: GatewayConfig,
}

impl DefaultVersionControl {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl VersionControl for DefaultVersionControl {
    fn resolve_latest_revision(&self, url: &str) -> Result<String> {
        let log = crate::svn::log(&self.config.svn_program, url, Some(1))?;
        crate::svn::parse_latest_revision(&log, url)
    }

    fn clone_with_history(
        &self,
        url: &str,
        target_dir: &Path,
        revision: Option<&str>,
    ) -> Result<String> {
        crate::git::svn_clone(&self.config.git_program, url, target_dir, revision)
    }

    fn list_externals(&self, url: &str, recursive: bool) -> Result<String> {
        crate::svn::get_externals(&self.config.svn_program, url, recursive)
    }

    fn list_ignore_patterns(&self, repo_dir: &Path) -> Result<String> {
        crate::git::show_ignore(&self.config.git_program, repo_dir)
    }

    fn create_branch(&self, repo_dir: &Path, name: &str) {
        if let Err(e) = crate::git::checkout_new_branch(&self.config.git_program, repo_dir, name) {
            warn!("Could not create branch '{}' in {}: {}", name, repo_dir.display(), e);
        }
    }
}
