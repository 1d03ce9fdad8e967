//! Property-based tests for the text parsers.
//!
//! These tests use proptest to generate random listings and log output and
//! verify that invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::externals::{parse, parse_definitions};
    use crate::git::parse_empty_dirs;
    use crate::svn::parse_latest_revision;
    use proptest::prelude::*;

    // ============================================================================
    // externals listing property tests
    // ============================================================================

    fn mount_line() -> impl Strategy<Value = (String, String)> {
        ("[a-zA-Z_][a-zA-Z0-9_.-]{0,12}", "[a-z]{1,8}").prop_map(|(name, host)| {
            let url = format!("http://{}.example.com/{}", host, name);
            (name, url)
        })
    }

    fn block() -> impl Strategy<Value = (String, Vec<(String, String)>)> {
        (
            prop::collection::vec("[a-z][a-z0-9_]{0,8}", 0..4),
            prop::collection::vec(mount_line(), 1..4),
        )
            .prop_map(|(segments, mounts)| (segments.join("/"), mounts))
    }

    fn render(source: &str, blocks: &[(String, Vec<(String, String)>)]) -> String {
        blocks
            .iter()
            .map(|(dir, mounts)| {
                let mut text = format!("{}/{} - ", source, dir);
                let lines: Vec<_> = mounts
                    .iter()
                    .map(|(name, url)| format!("{} {}", name, url))
                    .collect();
                text.push_str(&lines.join("\n"));
                text.push('\n');
                text
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    proptest! {
        /// Property: the parser never panics, whatever it is fed
        #[test]
        fn parse_never_panics(input in ".*", source in ".{0,20}") {
            let _ = parse(&input, &source);
        }

        /// Property: directories are always relative to the repository root
        #[test]
        fn parsed_dirs_are_relative(input in "([a-z/ .-]{0,20}\n){0,6}") {
            if let Ok(blocks) = parse(&input, "svn://host/repo") {
                for block in blocks {
                    prop_assert!(!block.parent_relative_dir.starts_with('/'));
                    prop_assert!(!block.parent_relative_dir.ends_with('/'));
                }
            }
        }

        /// Property: a well-formed listing yields every block and mount, in order
        #[test]
        fn well_formed_listing_is_fully_parsed(
            blocks in prop::collection::vec(block(), 0..5),
        ) {
            let source = "svn://svn.example.com/repo/trunk";
            let parsed = parse(&render(source, &blocks), source).unwrap();

            prop_assert_eq!(parsed.len(), blocks.len());
            for (got, (dir, mounts)) in parsed.iter().zip(&blocks) {
                prop_assert_eq!(&got.parent_relative_dir, dir);
                let names: Vec<_> = got.mounts.iter().map(|m| m.local_name.clone()).collect();
                let expected: Vec<_> = mounts.iter().map(|(n, _)| n.clone()).collect();
                prop_assert_eq!(names, expected);
            }
        }

        /// Property: link names never contain a path separator
        #[test]
        fn link_names_are_single_components(
            dir in "[a-z]{1,6}",
            name in "[a-z]{1,6}(/[a-z]{1,6}){0,3}/?",
        ) {
            let listing = format!("repo/{} - {} http://example.com/x\n", dir, name);
            let defs = parse_definitions(&listing, "repo").unwrap();

            prop_assert_eq!(defs.len(), 1);
            prop_assert!(!defs[0].local_name.contains('/'));
            prop_assert!(!defs[0].local_name.is_empty());
        }
    }

    // ============================================================================
    // svn log / git svn output property tests
    // ============================================================================

    proptest! {
        /// Property: the revision is the number after `r` on the second line
        #[test]
        fn latest_revision_is_second_line_number(rev in 1u64..10_000_000, author in "[a-z]{1,10}") {
            let log = format!(
                "{}\nr{} | {} | 2021-01-01 10:00:00 +0000 | 1 line\n\nmsg\n{}\n",
                "-".repeat(72),
                rev,
                author,
                "-".repeat(72)
            );

            prop_assert_eq!(parse_latest_revision(&log, "repo").unwrap(), rev.to_string());
        }

        /// Property: one marker per `W: +empty_dir:` line, in order
        #[test]
        fn empty_dir_markers_match_warning_lines(
            dirs in prop::collection::vec("[a-z]{1,8}(/[a-z]{1,8}){0,2}", 0..6),
        ) {
            let output: String = dirs
                .iter()
                .map(|d| format!("\tA\t{}/file\nW: +empty_dir: {}\n", d, d))
                .collect();

            let markers = parse_empty_dirs(&output).unwrap();
            let paths: Vec<_> = markers.iter().map(|m| m.path().to_string()).collect();
            prop_assert_eq!(paths, dirs);
        }
    }
}
