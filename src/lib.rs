//! # svn-migrate Library
//!
//! This library converts a Subversion repository into a git working copy
//! with `git svn`, keeping its `svn:externals` as separately cloned
//! repositories that are symlinked into the main tree. It is designed to be
//! used by the `svn-migrate` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use svn_migrate::externals;
//!
//! let listing = "svn://host/app/vendor/lib - libX svn://host/libX\n";
//! let mounts = externals::parse_definitions(listing, "svn://host/app").unwrap();
//!
//! assert_eq!(mounts[0].mount_path(), "vendor/lib/libX");
//! assert_eq!(mounts[0].source.url, "svn://host/libX");
//! ```
//!
//! ## Core Concepts
//!
//! - **Gateway (`gateway`, `svn`, `git`)**: The narrow `VersionControl`
//!   interface over the `svn` and `git` executables, and the parsing of their
//!   text output.
//! - **Externals (`externals`)**: Parsing of `svn propget svn:externals -R`
//!   listings into mount declarations.
//! - **Exclude registry (`exclude`)**: Append-only maintenance of
//!   `.git/info/exclude`.
//! - **Orchestrator (`orchestrator`)**: The per-repository sequence (pin
//!   revision, clone, restore empty directories, exclude, externals, branch),
//!   applied recursively to every external.
//! - **Output (`output`)**: The indentable progress reporter.
//!
//! ## Execution Flow
//!
//! 1.  Refuse to run if the target directory exists.
//! 2.  Resolve the newest revision of the source.
//! 3.  `git svn clone` at that revision and recreate empty directories.
//! 4.  Seed `.git/info/exclude` from `svn:ignore`.
//! 5.  Clone each external into `.externals/<name>` and symlink it into its
//!     mount directory.
//! 6.  Create the `working` branch.

pub mod error;
pub mod exclude;
pub mod exit_codes;
pub mod externals;
pub mod gateway;
pub mod git;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod svn;

#[cfg(test)]
mod externals_proptest;
