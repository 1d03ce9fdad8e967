//! Subversion client invocations and the parsing of their text output.

use std::ffi::OsStr;
use std::process::Command;

use log::warn;

use crate::error::{Error, Result};
use crate::git::run;

/// svn's "property not found" warning code.
const PROPERTY_NOT_FOUND: &str = "W200017";

/// Run `svn log`, optionally limited to the newest `limit` entries.
pub fn log(svn: &OsStr, url: &str, limit: Option<u32>) -> Result<String> {
    let mut cmd = Command::new(svn);
    cmd.arg("log");
    if let Some(limit) = limit {
        cmd.arg("--limit").arg(limit.to_string());
    }
    cmd.arg(url);

    let output = run(&mut cmd, "svn log", url)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run `svn propget svn:externals`, recursing into every path below `url`
/// when `recursive` is set.
///
/// A repository without any `svn:externals` yields an empty listing rather
/// than an error, whichever way the installed svn reports it.
pub fn get_externals(svn: &OsStr, url: &str, recursive: bool) -> Result<String> {
    let mut cmd = Command::new(svn);
    cmd.args(["propget", "svn:externals"]);
    if recursive {
        cmd.arg("-R");
    }
    cmd.arg(url);

    match run(&mut cmd, "svn propget svn:externals", url) {
        Ok(output) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
        Err(Error::ToolInvocation { stderr, .. }) if stderr.contains(PROPERTY_NOT_FOUND) => {
            warn!("No svn:externals set on {}", url);
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}

/// Extract the newest revision number from `svn log --limit 1` output.
///
/// The log starts with a separator line, so the newest entry's header is the
/// second line: `r482 | alice | 2021-01-01 ... | 1 line`. Its first token,
/// without the leading `r`, is the revision.
pub fn parse_latest_revision(log_output: &str, url: &str) -> Result<String> {
    let revision = log_output
        .lines()
        .nth(1)
        .and_then(|line| line.split_whitespace().next())
        .map(|token| token.strip_prefix('r').unwrap_or(token))
        .filter(|rev| !rev.is_empty());

    match revision {
        Some(rev) => Ok(rev.to_string()),
        None => Err(Error::RevisionParse {
            url: url.to_string(),
            output: log_output.to_string(),
        }),
    }
}
