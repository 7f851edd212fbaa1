// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Grouping of originals with their exported derivatives.
//!
//! `img.mpo`, `img-cropped.jps`, `img-cropped.spct` and `img-cropped-1.jps`
//! all share the key `img`. Navigation steps from group to group and opens
//! the best representative of each.

use super::media::{is_project_file, is_recognized};
use crate::engine::transform::Direction;
use crate::error::Result;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn cropped_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| Regex::new(r"(?i)-cropped(?:-(\d+))?$").expect("valid suffix pattern"))
}

/// File stem with any extension stripped, case preserved.
fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// File name with extension and any `-cropped[-N]` suffix removed, case
/// preserved.
pub fn base_name(name: &str) -> String {
    cropped_suffix().replace(stem(name), "").into_owned()
}

/// Grouping key: lowercased base name.
pub fn base_key(name: &str) -> String {
    base_name(&name.to_lowercase())
}

/// Index of the `-cropped[-N]` suffix: `None` for originals, `Some(0)` for
/// a bare `-cropped`, `Some(N)` otherwise.
pub fn suffix_index(name: &str) -> Option<u64> {
    let caps = cropped_suffix().captures(stem(name))?;
    Some(
        caps.get(1)
            .and_then(|n| n.as_str().parse().ok())
            .unwrap_or(0),
    )
}

/// Ranking used to pick a group's representative. `Less` means `a` is the
/// better choice.
pub fn priority(a: &str, b: &str) -> Ordering {
    // Derived files first, newest derivative first.
    suffix_index(b)
        .cmp(&suffix_index(a))
        // Project sidecars before images.
        .then_with(|| is_project_file(Path::new(b)).cmp(&is_project_file(Path::new(a))))
        .then_with(|| a.cmp(b))
}

/// The file to open by default for a group.
pub fn pick_default(group: &[String]) -> Option<&String> {
    group.iter().min_by(|a, b| priority(a, b))
}

/// Scan `dir` and group recognized files by base key.
pub fn group_files(dir: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_recognized(Path::new(&name)) {
            continue;
        }
        groups.entry(base_key(&name)).or_default().push(name);
    }
    for files in groups.values_mut() {
        files.sort();
    }
    Ok(groups)
}

/// The default file of the group before or after the one containing
/// `current`, wrapping around. `None` when there is nothing to move to.
pub fn navigate(current: &Path, direction: Direction) -> Result<Option<PathBuf>> {
    let dir = match current.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let Some(name) = current.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };

    let groups = group_files(dir)?;
    let keys: Vec<&String> = groups.keys().collect();
    let Some(index) = keys.iter().position(|k| **k == base_key(name)) else {
        log::debug!("{} is not part of any file group", current.display());
        return Ok(None);
    };

    let count = keys.len();
    let target = match direction {
        Direction::Previous => (index + count - 1) % count,
        Direction::Next => (index + 1) % count,
    };
    Ok(pick_default(&groups[keys[target]]).map(|file| dir.join(file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn test_base_key() {
        assert_eq!(base_key("IMG.MPO"), "img");
        assert_eq!(base_key("img-cropped.jps"), "img");
        assert_eq!(base_key("img-Cropped-12.spct"), "img");
        assert_eq!(base_key("img-cropped-x.jps"), "img-cropped-x");
        assert_eq!(base_key("trip-cropped-cropped.jps"), "trip-cropped");
        assert_eq!(base_name("Holiday-cropped-3.pns"), "Holiday");
    }

    #[test]
    fn test_suffix_index() {
        assert_eq!(suffix_index("img.mpo"), None);
        assert_eq!(suffix_index("img-cropped.jps"), Some(0));
        assert_eq!(suffix_index("img-cropped-7.jps"), Some(7));
    }

    #[test]
    fn test_priority_rule_order() {
        // Suffixed beats unsuffixed.
        assert_eq!(priority("img-cropped.jps", "img.mpo"), Ordering::Less);
        // Higher index beats a sidecar at a lower index.
        assert_eq!(priority("img-cropped-1.jps", "img-cropped.spct"), Ordering::Less);
        // Same index: sidecar beats image.
        assert_eq!(priority("img-cropped.spct", "img-cropped.jps"), Ordering::Less);
        // Otherwise lexical.
        assert_eq!(priority("a.jps", "a.mpo"), Ordering::Less);
    }

    #[test]
    fn test_group_and_pick_default() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["img.mpo", "img-cropped.jps", "img-cropped.spct", "img-cropped-1.jps", "notes.txt"],
        );

        let groups = group_files(dir.path()).unwrap();
        assert_eq!(groups.len(), 1);
        let group = &groups["img"];
        assert_eq!(group.len(), 4);
        assert_eq!(pick_default(group).map(String::as_str), Some("img-cropped-1.jps"));
    }

    #[test]
    fn test_navigate_wraps() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["a.mpo", "b.mpo", "b-cropped.jps", "b-cropped.spct", "c.pns"],
        );
        let current = dir.path().join("a.mpo");

        let next = navigate(&current, Direction::Next).unwrap();
        assert_eq!(next, Some(dir.path().join("b-cropped.spct")));

        let prev = navigate(&current, Direction::Previous).unwrap();
        assert_eq!(prev, Some(dir.path().join("c.pns")));

        let from_derived = navigate(&dir.path().join("b-cropped.jps"), Direction::Next).unwrap();
        assert_eq!(from_derived, Some(dir.path().join("c.pns")));
    }

    #[test]
    fn test_navigate_without_siblings_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["readme.txt"]);
        let current = dir.path().join("missing.mpo");
        assert_eq!(navigate(&current, Direction::Next).unwrap(), None);
    }

    #[test]
    fn test_single_group_navigates_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["only.jps"]);
        let current = dir.path().join("only.jps");
        assert_eq!(navigate(&current, Direction::Next).unwrap(), Some(current));
    }
}
