// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Removal of a previous run's tree.
//!
//! The roots default to scratch locations, but a misconfigured root could
//! point at a real mount. Content that does not look like a fake tree is
//! reported loudly before it is removed anyway.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{error, warn};

use super::writer::remove_tree;
use crate::common::config::FakeDriConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Sysfs,
    Devfs,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootKind::Sysfs => f.write_str("sysfs"),
            RootKind::Devfs => f.write_str("devfs"),
        }
    }
}

/// What happened to a root before generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootReset {
    /// Missing, empty, or unreadable; left alone.
    Untouched,
    /// Removed. `suspicious` explains why it may not have been a fake tree.
    Removed { suspicious: Option<String> },
    /// Removal was attempted and failed.
    RemoveFailed { reason: String },
}

fn suspicious_reason(kind: RootKind, path: &Path, names: &[String]) -> Option<String> {
    match kind {
        RootKind::Sysfs if names.len() > FakeDriConfig::MAX_FAKE_SYSFS_ENTRIES => Some(format!(
            ">{} entries in '{}' - real sysfs?",
            FakeDriConfig::MAX_FAKE_SYSFS_ENTRIES,
            path.display()
        )),
        RootKind::Devfs if names[0] != FakeDriConfig::FAKE_DEVFS_ENTRY || names.len() > 1 => {
            Some(format!(
                ">1 entries in '{}', or '{}' != '{}' - real devfs?",
                path.display(),
                names[0],
                FakeDriConfig::FAKE_DEVFS_ENTRY
            ))
        }
        _ => None,
    }
}

/// Inspect and remove an existing fake root.
pub fn reset_root(path: &Path, kind: RootKind) -> RootReset {
    let mut names: Vec<String> = match fs::read_dir(path) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return RootReset::Untouched,
        Err(e) => {
            error!("ReadDir() failed on fake {kind} path '{}': {e}", path.display());
            return RootReset::Untouched;
        }
    };
    if names.is_empty() {
        return RootReset::Untouched;
    }
    names.sort();

    let suspicious = suspicious_reason(kind, path, &names);
    if let Some(reason) = &suspicious {
        error!("{reason}");
    }

    warn!(
        "Removing already existing fake {kind} path '{}'",
        path.display()
    );
    match remove_tree(path) {
        Ok(()) => RootReset::Removed { suspicious },
        Err(e) => {
            error!(
                "Removing existing {kind} in '{}' failed: {e}",
                path.display()
            );
            RootReset::RemoveFailed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_empty_roots_are_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            reset_root(&tmp.path().join("nope"), RootKind::Sysfs),
            RootReset::Untouched
        );

        let empty = tmp.path().join("empty");
        fs::create_dir(&empty).unwrap();
        assert_eq!(reset_root(&empty, RootKind::Devfs), RootReset::Untouched);
        assert!(empty.exists());
    }

    #[test]
    fn test_fake_roots_are_removed_quietly() {
        let tmp = tempfile::tempdir().unwrap();
        let sys = tmp.path().join("sys");
        for dir in ["class/drm", "bus/pci", "kernel/debug"] {
            fs::create_dir_all(sys.join(dir)).unwrap();
        }
        assert_eq!(
            reset_root(&sys, RootKind::Sysfs),
            RootReset::Removed { suspicious: None }
        );
        assert!(!sys.exists());

        let dev = tmp.path().join("dev");
        fs::create_dir_all(dev.join("dri/by-path")).unwrap();
        assert_eq!(
            reset_root(&dev, RootKind::Devfs),
            RootReset::Removed { suspicious: None }
        );
        assert!(!dev.exists());
    }

    #[test]
    fn test_unexpected_content_is_flagged_but_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let sys = tmp.path().join("sys");
        for dir in ["block", "bus", "class", "devices"] {
            fs::create_dir_all(sys.join(dir)).unwrap();
        }
        match reset_root(&sys, RootKind::Sysfs) {
            RootReset::Removed {
                suspicious: Some(reason),
            } => assert!(reason.contains("real sysfs?")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!sys.exists());

        let dev = tmp.path().join("dev");
        fs::create_dir_all(dev.join("null-ish")).unwrap();
        match reset_root(&dev, RootKind::Devfs) {
            RootReset::Removed {
                suspicious: Some(reason),
            } => assert!(reason.contains("'null-ish' != 'dri'")),
            other => panic!("unexpected {other:?}"),
        }

        fs::create_dir_all(dev.join("dri")).unwrap();
        fs::create_dir_all(dev.join("extra")).unwrap();
        match reset_root(&dev, RootKind::Devfs) {
            RootReset::Removed {
                suspicious: Some(reason),
            } => {
                // the name matches, so only the extra entry can flag it
                assert!(reason.contains("'dri' != 'dri'"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!dev.exists());
    }
}
