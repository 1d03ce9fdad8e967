//! Shared test utilities for the CLI end-to-end tests.
//!
//! The migration drives two external programs, `svn` and `git`. These tests
//! never need real ones: `MigrationFixture` writes small shell scripts that
//! imitate the handful of subcommands svn-migrate runs, backed by plain files
//! in the fixture's temporary directory, and points the binary at them with
//! `--svn` and `--git`.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[serial]
//! fn test_example() {
//!     let fixture = MigrationFixture::new().with_revision(urls::APP, "482");
//!     fixture.command().arg(urls::APP).arg(fixture.target()).assert().success();
//! }
//! ```
//!
//! Tests that execute the fake tools must be `#[serial]`: a script that is
//! executed while another test thread is still writing its own script can
//! fail with "Text file busy".

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;
    pub use serial_test::serial;

    pub use super::urls;
    pub use super::MigrationFixture;
}

/// Repository URLs the fake svn serves.
pub mod urls {
    pub const APP: &str = "file:///fake/repos/app";
    pub const LIB_X: &str = "file:///fake/repos/libX";
    pub const LIB_Y: &str = "file:///fake/repos/libY";
}

const FAKE_SVN: &str = r##"#!/bin/sh
DATA='@DATA@'
cmd="$1"
shift
url=""
for arg in "$@"; do url="$arg"; done
key=$(printf '%s' "$url" | tr -c 'A-Za-z0-9' '_')

if [ -f "$DATA/unreachable-$key" ]; then
    echo "svn: E170013: Unable to connect to a repository at URL '$url'" >&2
    exit 1
fi

case "$cmd" in
    log)
        rev=1
        if [ -f "$DATA/rev-$key" ]; then rev=$(cat "$DATA/rev-$key"); fi
        echo "------------------------------------------------------------------------"
        echo "r$rev | alice | 2021-01-01 10:00:00 +0000 (Fri, 01 Jan 2021) | 1 line"
        echo ""
        echo "Latest change"
        echo "------------------------------------------------------------------------"
        ;;
    propget)
        if [ -f "$DATA/externals-$key" ]; then
            cat "$DATA/externals-$key"
        else
            echo "svn: warning: W200017: Property 'svn:externals' not found on '$url'" >&2
            echo "svn: E200000: A problem occurred; see other errors for details" >&2
            exit 1
        fi
        ;;
    *)
        echo "fake svn: unsupported command: $cmd" >&2
        exit 1
        ;;
esac
"##;

const FAKE_GIT: &str = r##"#!/bin/sh
DATA='@DATA@'

if [ "$1" = "svn" ] && [ "$2" = "clone" ]; then
    shift 2
    rev=""
    range=""
    if [ "$1" = "-r" ]; then
        range="$2"
        case "$2" in
            1:[0-9]*) rev="${2#1:}" ;;
            *) echo "fake git: expected a 1:REV history range, got '$2'" >&2; exit 1 ;;
        esac
        shift 2
    fi
    url="$1"
    target="$2"
    key=$(printf '%s' "$url" | tr -c 'A-Za-z0-9' '_')
    mkdir -p "$target/.git/info" || exit 1
    echo "$url@$range" >> "$DATA/clones.log"
    echo "Initialized empty Git repository in $target/.git/"
    if [ -f "$DATA/clone-output-$key" ]; then cat "$DATA/clone-output-$key" >&2; fi
    echo "r$rev = 0123456789abcdef0123456789abcdef01234567 (refs/remotes/git-svn)"
    exit 0
fi

if [ "$1" = "svn" ] && [ "$2" = "show-ignore" ]; then
    echo "# /"
    echo "/build"
    exit 0
fi

if [ "$1" = "checkout" ] && [ "$2" = "-b" ]; then
    if [ -f .git/BRANCH ]; then
        echo "fatal: a branch named '$3' already exists" >&2
        exit 128
    fi
    printf '%s\n' "$3" > .git/BRANCH
    exit 0
fi

echo "fake git: unsupported command: $*" >&2
exit 1
"##;

/// File-name key the fake tools derive from a URL.
fn url_key(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// A temporary directory holding fake `svn` and `git` executables, the data
/// they serve, and room for a migration target.
pub struct MigrationFixture {
    temp_dir: assert_fs::TempDir,
}

impl MigrationFixture {
    /// Create a fixture with both fake tools installed and no repositories
    /// configured beyond the defaults (revision 1, no externals).
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("data")
            .create_dir_all()
            .expect("Failed to create data directory");

        let fixture = Self { temp_dir };
        fixture.install_script("svn", FAKE_SVN);
        fixture.install_script("git", FAKE_GIT);
        fixture
    }

    fn install_script(&self, name: &str, template: &str) {
        let data = self.data_dir();
        let script = template.replace("@DATA@", &data.to_string_lossy());
        let path = self.temp_dir.path().join("bin").join(name);

        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create bin directory");
        fs::write(&path, script).expect("Failed to write fake tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake tool executable");
    }

    fn write_data(&self, name: &str, content: &str) {
        self.temp_dir
            .child("data")
            .child(name)
            .write_str(content)
            .expect("Failed to write fake tool data");
    }

    /// Make `svn log` report `rev` as the newest revision of `url`.
    pub fn with_revision(self, url: &str, rev: &str) -> Self {
        self.write_data(&format!("rev-{}", url_key(url)), rev);
        self
    }

    /// Make `svn propget svn:externals -R` print `listing` for `url`.
    pub fn with_externals(self, url: &str, listing: &str) -> Self {
        self.write_data(&format!("externals-{}", url_key(url)), listing);
        self
    }

    /// Extra text `git svn clone` prints on stderr when cloning `url`.
    pub fn with_clone_output(self, url: &str, output: &str) -> Self {
        self.write_data(&format!("clone-output-{}", url_key(url)), output);
        self
    }

    /// Make every svn command against `url` fail.
    pub fn unreachable(self, url: &str) -> Self {
        self.write_data(&format!("unreachable-{}", url_key(url)), "");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    pub fn svn(&self) -> PathBuf {
        self.temp_dir.path().join("bin/svn")
    }

    pub fn git(&self) -> PathBuf {
        self.temp_dir.path().join("bin/git")
    }

    /// The (not yet existing) migration target.
    pub fn target(&self) -> PathBuf {
        self.temp_dir.path().join("work/app")
    }

    /// Every `url@range` the fake git was asked to clone, in order.
    pub fn clones(&self) -> Vec<String> {
        fs::read_to_string(self.data_dir().join("clones.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Create a command wired to the fake tools, without colors.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("svn-migrate");
        cmd.current_dir(self.path())
            .env_remove("SVN_MIGRATE_BRANCH")
            .env_remove("SVN_MIGRATE_JOBS")
            .env_remove("RUST_LOG")
            .env_remove("SVN_MIGRATE_GIT")
            .env_remove("SVN_MIGRATE_SVN")
            .arg("--svn")
            .arg(self.svn())
            .arg("--git")
            .arg(self.git())
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for MigrationFixture {
    fn default() -> Self {
        Self::new()
    }
}
