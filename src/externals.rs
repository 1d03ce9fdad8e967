//! # svn:externals Listing Parser
//!
//! Turns the text printed by `svn propget svn:externals -R <url>` into
//! structured mount declarations. This is a pure text transformation: no
//! process, network or filesystem access happens here.
//!
//! ## Format
//!
//! The listing is a sequence of blocks separated by blank lines. Each block
//! starts with `<dir> - ` followed by the first mount, and every further line
//! of the block is another mount:
//!
//! ```text
//! svn://host/repo/vendor/libfoo - libfoo http://example.com/libfoo
//! other https://example.com/other
//!
//! svn://host/repo/vendor/libbar - libbar http://example.com/libbar
//! ```
//!
//! `<dir>` is qualified with the URL that was queried; that prefix is removed
//! so the directory is relative to the repository root. Scheme and host are
//! compared case-insensitively, the path exactly, and only on a `/` boundary.
//! A mount line is `<localName> <url>`; the newer `<url> <localName>` ordering
//! is recognised and swapped. Comment lines (`#`) and blank lines inside a
//! block are skipped.
//!
//! Relative external URLs (`^/`, `../`, `//`, `/`) need a working copy to be
//! resolved and are rejected.

use crate::error::{Error, Result};
use crate::model::{ExternalDefinition, RepositoryReference};

/// One block of the listing: every mount declared on a single directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalsBlock {
    /// Directory holding the property, relative to the repository root.
    pub parent_relative_dir: String,
    pub mounts: Vec<Mount>,
}

/// A single `<localName> <url>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub local_name: String,
    pub url: String,
}

/// Parses a raw externals listing queried from `source_url`.
///
/// Fails with [`Error::ExternalsParse`] on a block without the `" - "`
/// separator, a blank header path, a header outside `source_url`, or a mount
/// line with no URL or a relative one.
pub fn parse(raw: &str, source_url: &str) -> Result<Vec<ExternalsBlock>> {
    split_blocks(raw)
        .into_iter()
        .map(|block| parse_block(&block, source_url))
        .collect()
}

/// Parses and flattens the listing into one definition per mount, in
/// declaration order.
pub fn parse_definitions(raw: &str, source_url: &str) -> Result<Vec<ExternalDefinition>> {
    let blocks = parse(raw, source_url)?;

    Ok(blocks
        .into_iter()
        .flat_map(|block| {
            let dir = block.parent_relative_dir;
            block
                .mounts
                .into_iter()
                .map(move |mount| ExternalDefinition {
                    parent_relative_dir: dir.clone(),
                    local_name: mount.local_name,
                    source: RepositoryReference::latest(mount.url),
                })
        })
        .collect())
}

fn split_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str], source_url: &str) -> Result<ExternalsBlock> {
    let block_text = lines.join("\n");
    let malformed = |message: &str| Error::ExternalsParse {
        message: message.to_string(),
        block: block_text.clone(),
    };

    let (header, first_mount) = lines[0]
        .split_once(" - ")
        .ok_or_else(|| malformed("missing ' - ' separator after the directory"))?;

    if header.trim().is_empty() {
        return Err(malformed("blank directory before ' - '"));
    }

    let parent_relative_dir = relative_dir(header.trim(), source_url).ok_or_else(|| {
        malformed(&format!("directory is not below {}", source_url))
    })?;

    let mut mounts = Vec::new();
    for line in std::iter::once(first_mount).chain(lines[1..].iter().copied()) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mount = parse_mount(line).ok_or_else(|| malformed("mount line has no URL"))?;
        if is_relative_url(&mount.url) {
            return Err(malformed(&format!(
                "relative external URL {} is not supported",
                mount.url
            )));
        }
        mounts.push(mount);
    }

    Ok(ExternalsBlock {
        parent_relative_dir,
        mounts,
    })
}

/// Strips `source_url` from a header path and returns what remains relative
/// to the repository root, or `None` when the header is not at or below it.
fn relative_dir(header: &str, source_url: &str) -> Option<String> {
    let rest = strip_source(header, source_url.trim_end_matches('/'))?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let relative = rest.trim_matches('/');
    if relative.split('/').any(|component| component == "..") {
        return None;
    }

    if relative == "." {
        Some(String::new())
    } else {
        Some(relative.to_string())
    }
}

fn strip_source<'a>(header: &'a str, source: &str) -> Option<&'a str> {
    let (root, path) = source.split_at(authority_end(source));
    let header_root = header.get(..root.len())?;
    if !header_root.eq_ignore_ascii_case(root) {
        return None;
    }
    header[root.len()..].strip_prefix(path)
}

/// Byte offset just past `scheme://host[:port]`, or 0 for a plain path.
fn authority_end(url: &str) -> usize {
    match url.find("://") {
        Some(i) => {
            let host_start = i + 3;
            url[host_start..]
                .find('/')
                .map_or(url.len(), |j| host_start + j)
        }
        None => 0,
    }
}

fn parse_mount(line: &str) -> Option<Mount> {
    let (first, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let (name, url) = if looks_like_url(first) && !looks_like_url(rest) {
        (rest, first)
    } else {
        (first, rest)
    };

    Some(Mount {
        local_name: link_name(name),
        url: url.to_string(),
    })
}

fn looks_like_url(token: &str) -> bool {
    token.contains("://") || token.starts_with("^/")
}

fn is_relative_url(url: &str) -> bool {
    ["^/", "../", "//", "/"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Final path component of a mount name; links are always created directly
/// inside the mount directory.
fn link_name(name: &str) -> String {
    name.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(name)
        .to_string()
}
