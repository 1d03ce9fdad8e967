use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;
use regex::Regex;

use crate::error::Error;
use crate::model::EmptyDirMarker;

/// Line `git svn clone` prints for every directory it could not represent.
const EMPTY_DIR_PATTERN: &str = r"^W: \+empty_dir: (.*)$";

/// Runs a prepared command and returns its output, mapping spawn failures
/// and non-zero exits to [`Error::ToolInvocation`].
pub(crate) fn run(cmd: &mut Command, command: &str, url: &str) -> Result<Output, Error> {
    debug!("Running {:?}", cmd);

    let output = cmd.output().map_err(|e| Error::ToolInvocation {
        command: command.to_string(),
        url: url.to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = if stderr.trim().is_empty() {
            // git svn reports some failures on stdout only
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::ToolInvocation {
            command: command.to_string(),
            url: url.to_string(),
            stderr,
        });
    }

    Ok(output)
}

/// Arguments of `git svn clone`.
///
/// A pinned clone fetches the range `1:<revision>`. A bare `-r <revision>`
/// would import that single revision only.
pub fn svn_clone_args(url: &str, target_dir: &Path, revision: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["svn".into(), "clone".into()];
    if let Some(rev) = revision {
        args.push("-r".into());
        args.push(format!("1:{}", rev).into());
    }
    args.push(url.into());
    args.push(target_dir.into());
    args
}

/// Clone a Subversion repository with its full history using `git svn`
///
/// When `revision` is given the clone stops at that revision, so that the
/// tree matches the externals listing queried for the same snapshot.
/// Returns stdout and stderr concatenated, since `git svn` prints its
/// empty-directory warnings on stderr.
pub fn svn_clone(
    git: &OsStr,
    url: &str,
    target_dir: &Path,
    revision: Option<&str>,
) -> Result<String, Error> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut cmd = Command::new(git);
    cmd.args(svn_clone_args(url, target_dir, revision));

    let output = run(&mut cmd, "git svn clone", url)?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

/// Print the ignore patterns `git svn` derives from `svn:ignore` for the
/// working tree at `repo_dir`.
pub fn show_ignore(git: &OsStr, repo_dir: &Path) -> Result<String, Error> {
    let mut cmd = Command::new(git);
    cmd.args(["svn", "show-ignore"]).current_dir(repo_dir);

    let output = run(&mut cmd, "git svn show-ignore", &repo_dir.display().to_string())?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Create and switch to `branch` in the working tree at `repo_dir`.
pub fn checkout_new_branch(git: &OsStr, repo_dir: &Path, branch: &str) -> Result<(), Error> {
    let mut cmd = Command::new(git);
    cmd.args(["checkout", "-b", branch]).current_dir(repo_dir);

    run(&mut cmd, "git checkout -b", &repo_dir.display().to_string())?;
    Ok(())
}

/// Extract the empty-directory markers from `git svn clone` output
pub fn parse_empty_dirs(clone_output: &str) -> Result<Vec<EmptyDirMarker>, Error> {
    let pattern = Regex::new(EMPTY_DIR_PATTERN)?;

    Ok(clone_output
        .lines()
        .filter_map(|line| pattern.captures(line.trim_end_matches('\r')))
        .filter_map(|caps| caps.get(1))
        .map(|m| EmptyDirMarker(m.as_str().to_string()))
        .collect())
}
