//! # Error Handling
//!
//! This module defines the centralized error type for `svn-migrate`. It uses
//! the `thiserror` library to describe every anticipated failure mode of a
//! migration run with a clear, single-line message.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of everything that can abort a migration, from an
//!   existing target directory to a failed `git svn clone`.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! No error is retried or rolled back. A migration is a one-shot,
//! operator-supervised run, so the first failure surfaces immediately and
//! leaves whatever was already created on disk in place.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for svn-migrate operations
#[derive(Error, Debug)]
pub enum Error {
    /// The top-level target directory already exists.
    ///
    /// Checked before anything else runs, so nothing has been written when
    /// this is returned.
    #[error("target {} already exists - please move it!", path.display())]
    TargetExists { path: PathBuf },

    /// A version-control process could not be spawned or exited abnormally.
    #[error("{command} failed for {url}: {stderr}")]
    ToolInvocation {
        command: String,
        url: String,
        stderr: String,
    },

    /// `svn log` output did not carry a revision token where one was expected.
    #[error("Unable to determine the latest revision of {url} from log output: {output:?}")]
    RevisionParse { url: String, output: String },

    /// The `svn:externals` listing was malformed.
    #[error("Malformed svn:externals listing: {message} (in block {block:?})")]
    ExternalsParse { message: String, block: String },

    /// An external (directly or transitively) references a repository that is
    /// already being migrated on the current path.
    #[error("Cycle detected in svn:externals: {cycle}")]
    CycleDetected { cycle: String },

    /// A filesystem operation could not be carried out as requested.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error indicating that a mutex has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// The worker pool for parallel external clones could not be started.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// True for failures reported by (or while talking to) an external tool.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            Error::ToolInvocation { .. } | Error::RevisionParse { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
