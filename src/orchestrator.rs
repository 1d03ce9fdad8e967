//! # Migration Orchestrator
//!
//! Drives one migration from a Subversion repository to a git working copy.
//! For every repository (the top-level one and each external) the same
//! sequence runs, strictly in order:
//!
//! 1.  **Resolve**: pin the newest revision of the source, so the clone and
//!     the externals listing describe the same snapshot.
//! 2.  **Clone**: `git svn clone` at that revision.
//! 3.  **Restore empty directories** reported by the clone.
//! 4.  **Exclude**: copy `svn:ignore` into `.git/info/exclude`, plus the
//!     `.gitignore` trailer.
//! 5.  **Externals**: list and parse `svn:externals`; clone every external
//!     into `.externals/<name>` (reusing clones that already exist) by
//!     recursing into this same sequence, then symlink it into its mount
//!     directory and exclude the mount path.
//! 6.  **Branch**: create and check out the working branch.
//!
//! Externals are not pinned to the parent's revision: each resolves its own
//! newest revision at the moment it is cloned.
//!
//! ## Concurrency
//!
//! With `jobs > 1` the distinct, not-yet-cloned externals of one tree are
//! cloned in parallel on a `rayon` pool before linking. Target directories are
//! reserved atomically (check-then-insert under a lock) so two parents
//! referencing the same external never clone it twice. Only the thread holding
//! a tree's reservation writes that tree's exclude file; the parent's mount
//! paths are appended afterwards, in declaration order, on the calling thread.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::{Error, Result};
use crate::exclude::ExcludeRegistry;
use crate::externals;
use crate::gateway::VersionControl;
use crate::git;
use crate::model::{CloneResult, ExternalDefinition, RepositoryReference};
use crate::output::Reporter;

/// Hidden directory holding one clone per external repository.
pub const EXTERNALS_DIR: &str = ".externals";

/// Branch created in every converted working tree.
pub const DEFAULT_BRANCH: &str = "working";

/// Tunables of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Name of the branch created after conversion.
    pub branch: String,
    /// How many sibling externals may be cloned at once.
    pub jobs: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            jobs: 1,
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub target: PathBuf,
    /// The top-level source, pinned to the revision that was cloned.
    pub source: RepositoryReference,
    /// Repositories cloned, the top-level one included.
    pub repositories: usize,
    /// Symlinks created or refreshed at externals mount points.
    pub links: usize,
}

/// The main entry point for running a migration.
pub struct CloneOrchestrator {
    vcs: Box<dyn VersionControl>,
    options: MigrationOptions,
    pool: Option<ThreadPool>,
    reserved: Mutex<HashSet<PathBuf>>,
    cloned: AtomicUsize,
    linked: AtomicUsize,
}

impl CloneOrchestrator {
    /// Creates an orchestrator over the given version-control gateway.
    ///
    /// A worker pool is only started when `options.jobs` exceeds one.
    pub fn new(vcs: Box<dyn VersionControl>, options: MigrationOptions) -> Result<Self> {
        let pool = if options.jobs > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(options.jobs)
                    .thread_name(|i| format!("svn-migrate-{}", i))
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            vcs,
            options,
            pool,
            reserved: Mutex::new(HashSet::new()),
            cloned: AtomicUsize::new(0),
            linked: AtomicUsize::new(0),
        })
    }

    /// Migrates `source` into the new directory `target`.
    ///
    /// Fails with [`Error::TargetExists`] before touching anything when
    /// `target` is already present. Any later failure aborts the run and
    /// leaves the partially populated tree behind.
    pub fn run(
        &self,
        source: &RepositoryReference,
        target: &Path,
        reporter: &Reporter,
    ) -> Result<MigrationSummary> {
        let target = std::path::absolute(target)?;
        check_for_local_dir(&target)?;
        if !self.reserve(&target)? {
            return Err(Error::TargetExists { path: target });
        }

        self.cloned.store(0, Ordering::SeqCst);
        self.linked.store(0, Ordering::SeqCst);

        let result = self.migrate(source.clone(), &target, reporter, &[])?;

        Ok(MigrationSummary {
            target,
            source: result.source,
            repositories: self.cloned.load(Ordering::SeqCst),
            links: self.linked.load(Ordering::SeqCst),
        })
    }

    /// The full per-repository sequence, guarded against externals that
    /// lead back to a repository already on `active`.
    fn migrate(
        &self,
        source: RepositoryReference,
        target: &Path,
        reporter: &Reporter,
        active: &[String],
    ) -> Result<CloneResult> {
        let key = source.url.trim_end_matches('/').to_string();
        if active.contains(&key) {
            let mut cycle = active.to_vec();
            cycle.push(key);
            return Err(Error::CycleDetected {
                cycle: cycle.join(" -> "),
            });
        }

        let mut active = active.to_vec();
        active.push(key);

        let result = self.clone_repository(source, target, reporter)?;
        self.clone_externals_on_path(&result.source.url, target, reporter, &active)?;
        self.create_working_branch(target, reporter);

        Ok(result)
    }

    /// Steps 1-4: pin the revision, clone, recreate empty directories and
    /// seed the exclude registry.
    ///
    /// A `source` that already carries a revision is cloned at that revision
    /// without asking the server again.
    pub fn clone_repository(
        &self,
        source: RepositoryReference,
        target: &Path,
        reporter: &Reporter,
    ) -> Result<CloneResult> {
        let source = match source.revision {
            Some(_) => source,
            None => {
                reporter.step("🔍", format!("finding latest revision of {}", source.url));
                let revision = self.vcs.resolve_latest_revision(&source.url)?;
                source.at(revision)
            }
        };
        let revision = source.revision.as_deref();

        reporter.step(
            "📦",
            format!("creating git repository in {} from {}", target.display(), source),
        );
        let nested = reporter.nested();

        let output = self.vcs.clone_with_history(&source.url, target, revision)?;
        self.cloned.fetch_add(1, Ordering::SeqCst);

        let empty_dirs = git::parse_empty_dirs(&output)?;
        for dir in &empty_dirs {
            let relative = dir.relative_path().ok_or_else(|| Error::Filesystem {
                message: format!(
                    "refusing to create empty directory {} outside {}",
                    dir.path(),
                    target.display()
                ),
            })?;
            nested.say(format!("making empty directory: {}", dir.path()));
            fs::create_dir_all(target.join(relative))?;
        }

        nested.say("setting ignored files from subversion (this can take a while)");
        let patterns = self.vcs.list_ignore_patterns(target)?;
        ExcludeRegistry::for_repository(target).append_converted_ignores(&patterns)?;

        Ok(CloneResult {
            target_path: target.to_path_buf(),
            source,
            empty_dirs,
        })
    }

    /// Step 5: clone (or reuse) and link every external declared below
    /// `source_url` into the working tree at `target`.
    ///
    /// Safe to repeat: externals whose storage directory already exists are
    /// not cloned again, but their links are recreated and their mount paths
    /// appended to the exclude registry once more.
    pub fn clone_externals(
        &self,
        source_url: &str,
        target: &Path,
        reporter: &Reporter,
    ) -> Result<usize> {
        let active = [source_url.trim_end_matches('/').to_string()];
        self.clone_externals_on_path(source_url, target, reporter, &active)
    }

    fn clone_externals_on_path(
        &self,
        source_url: &str,
        target: &Path,
        reporter: &Reporter,
        active: &[String],
    ) -> Result<usize> {
        reporter.step("🔗", format!("checking for svn:externals to install from {}", source_url));
        let nested = reporter.nested();

        let listing = self.vcs.list_externals(source_url, true)?;
        let definitions = externals::parse_definitions(&listing, source_url)?;
        debug!("{} declares {} externals", source_url, definitions.len());

        let storage = target.join(EXTERNALS_DIR);
        fs::create_dir_all(&storage)?;

        let registry = ExcludeRegistry::for_repository(target);
        registry.append(EXTERNALS_DIR)?;

        if self.pool.is_some() {
            self.prefetch_externals(&definitions, &storage, &nested, active)?;
        }

        for definition in &definitions {
            let clone_dir = storage.join(&definition.local_name);

            if self.reserve(&clone_dir)? {
                self.migrate(definition.source.clone(), &clone_dir, &nested, active)?;
            } else {
                info!("Reusing existing clone at {}", clone_dir.display());
            }

            self.link_external(definition, target, &clone_dir, &nested)?;
            registry.append(&definition.mount_path())?;
        }

        Ok(definitions.len())
    }

    /// Clones the distinct externals that are not present yet, in parallel.
    fn prefetch_externals(
        &self,
        definitions: &[ExternalDefinition],
        storage: &Path,
        reporter: &Reporter,
        active: &[String],
    ) -> Result<()> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        let mut pending = Vec::new();
        for definition in definitions {
            let clone_dir = storage.join(&definition.local_name);
            if self.reserve(&clone_dir)? {
                pending.push((definition, clone_dir));
            }
        }

        if pending.len() > 1 {
            debug!("Cloning {} externals in parallel", pending.len());
        }

        pool.install(|| {
            pending
                .par_iter()
                .map(|(definition, clone_dir)| {
                    self.migrate(definition.source.clone(), clone_dir, reporter, active)
                        .map(|_| ())
                })
                .collect::<Result<Vec<()>>>()
        })?;

        Ok(())
    }

    fn link_external(
        &self,
        definition: &ExternalDefinition,
        target: &Path,
        clone_dir: &Path,
        reporter: &Reporter,
    ) -> Result<()> {
        let mount_dir = target.join(&definition.parent_relative_dir);
        reporter.say(format!(
            "symlinking {} into {}",
            definition.local_name,
            mount_dir.display()
        ));

        fs::create_dir_all(&mount_dir)?;
        force_symlink(clone_dir, &mount_dir.join(&definition.local_name))?;
        self.linked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Step 6.
    fn create_working_branch(&self, target: &Path, reporter: &Reporter) {
        reporter.step(
            "🌿",
            format!(
                "creating '{}' branch on {}",
                self.options.branch,
                target.display()
            ),
        );
        self.vcs.create_branch(target, &self.options.branch);
    }

    /// Claims `path` as a clone destination. Returns false when it already
    /// exists on disk or another caller has claimed it.
    fn reserve(&self, path: &Path) -> Result<bool> {
        let mut reserved = self.reserved.lock().map_err(|_| Error::LockPoisoned {
            context: "clone reservations".to_string(),
        })?;

        if path_exists(path) || reserved.contains(path) {
            return Ok(false);
        }

        reserved.insert(path.to_path_buf());
        Ok(true)
    }
}

fn check_for_local_dir(target: &Path) -> Result<()> {
    if path_exists(target) {
        return Err(Error::TargetExists {
            path: target.to_path_buf(),
        });
    }
    Ok(())
}

/// True for anything at `path`, dangling symlinks included.
fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Points `link` at `original`, replacing an existing link or file.
fn force_symlink(original: &Path, link: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() || meta.is_file() => {
            // Directory links on Windows have to be removed as directories
            fs::remove_file(link).or_else(|_| fs::remove_dir(link))?;
        }
        Ok(_) => {
            return Err(Error::Filesystem {
                message: format!(
                    "cannot link external at {}: a directory is in the way",
                    link.display()
                ),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(original, link)?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_dir(original, link)?;

    Ok(())
}
