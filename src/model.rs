//! Plain data carried between the parsers, the gateway and the orchestrator.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

/// A source repository and, once resolved, the exact revision to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    pub url: String,
    pub revision: Option<String>,
}

impl RepositoryReference {
    /// A reference that still tracks the latest revision.
    pub fn latest(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            revision: None,
        }
    }

    /// Pins this reference to `revision`.
    pub fn at(self, revision: impl Into<String>) -> Self {
        Self {
            revision: Some(revision.into()),
            ..self
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.revision.is_some()
    }

    /// Normalizes a source given on the command line.
    ///
    /// Anything that parses as a URL is kept verbatim. A non-URL that names an
    /// existing local directory becomes a `file://` URL, which is what both
    /// `svn` and `git svn` expect for local repositories. Everything else is
    /// passed through untouched and left for the tools to reject.
    pub fn from_source_argument(source: &str) -> Self {
        if Url::parse(source).is_ok() {
            return Self::latest(source);
        }

        let path = Path::new(source);
        if path.is_dir() {
            if let Ok(url) = std::path::absolute(path)
                .map_err(|_| ())
                .and_then(Url::from_directory_path)
            {
                // svn rejects the trailing slash on repository roots
                return Self::latest(url.as_str().trim_end_matches('/'));
            }
        }

        Self::latest(source)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}@r{}", self.url, rev),
            None => write!(f, "{}", self.url),
        }
    }
}

/// One `svn:externals` mount: `local_name` inside `parent_relative_dir`,
/// pointing at another repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDefinition {
    /// Relative to the root of the scanned repository; empty for the root.
    pub parent_relative_dir: String,
    pub local_name: String,
    pub source: RepositoryReference,
}

impl ExternalDefinition {
    /// The mount path relative to the working tree root, as registered in the
    /// exclude file.
    pub fn mount_path(&self) -> String {
        if self.parent_relative_dir.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}/{}", self.parent_relative_dir, self.local_name)
        }
    }
}

/// A directory `git svn` reported as empty; git does not track it, so it has
/// to be recreated by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyDirMarker(pub String);

impl EmptyDirMarker {
    pub fn path(&self) -> &str {
        &self.0
    }

    /// The marker as a path inside the working tree, or `None` when it is
    /// absolute or climbs out through `..`.
    pub fn relative_path(&self) -> Option<&Path> {
        let path = Path::new(&self.0);
        path.components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
            .then_some(path)
    }
}

/// Output of one clone-and-normalize step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneResult {
    pub target_path: PathBuf,
    pub source: RepositoryReference,
    pub empty_dirs: Vec<EmptyDirMarker>,
}
