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

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{symlink, DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use super::device_node::make_null_device;
use super::{BuildStep, GenerationStats, StepOutcome};
use crate::common::config::FakeDriConfig;
use crate::error::{Error, Result};

/// Filesystem primitives that tally every entry they create.
///
/// One writer lives for one build step, so the tally it hands back in
/// [`TreeWriter::finish`] is exactly what that step produced.
#[derive(Debug, Default)]
pub struct TreeWriter {
    stats: GenerationStats,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats
    }

    /// Create `path` and any missing parents. Counts one directory when
    /// the leaf did not exist yet, so shared parents are not recounted.
    pub fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        let existed = path.is_dir();
        DirBuilder::new()
            .recursive(true)
            .mode(FakeDriConfig::DIR_MODE)
            .create(path)
            .map_err(|source| Error::CreateDir {
                path: path.to_path_buf(),
                source,
            })?;
        if !existed {
            self.stats.dirs += 1;
        }
        Ok(())
    }

    /// Create a single directory whose parent must exist. Fails if it is
    /// already there.
    pub fn create_dir(&mut self, path: &Path) -> Result<()> {
        DirBuilder::new()
            .mode(FakeDriConfig::DIR_MODE)
            .create(path)
            .map_err(|source| Error::CreateDir {
                path: path.to_path_buf(),
                source,
            })?;
        self.stats.dirs += 1;
        Ok(())
    }

    /// Write a sysfs style attribute, truncating any previous content.
    pub fn write_file(&mut self, path: &Path, contents: &str) -> Result<()> {
        let write_err = |source: std::io::Error| Error::WriteFile {
            path: path.to_path_buf(),
            source,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(FakeDriConfig::FILE_MODE)
            .open(path)
            .map_err(write_err)?;
        self.stats.files += 1;
        file.write_all(contents.as_bytes()).map_err(write_err)
    }

    /// Create a file that must not exist yet and hand it back for writing.
    pub fn create_new_file(&mut self, path: &Path) -> Result<File> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(FakeDriConfig::FILE_MODE)
            .open(path)
            .map_err(|source| Error::WriteFile {
                path: path.to_path_buf(),
                source,
            })?;
        self.stats.files += 1;
        Ok(file)
    }

    /// Create `link` pointing at `target`. Relative targets are stored as is.
    pub fn symlink(&mut self, target: &str, link: &Path) -> Result<()> {
        symlink(target, link).map_err(|source| Error::Symlink {
            link: link.to_path_buf(),
            target: target.to_string(),
            source,
        })?;
        self.stats.symlinks += 1;
        Ok(())
    }

    /// Create a character device node aliasing the null device.
    pub fn null_device(&mut self, path: &Path) -> Result<()> {
        make_null_device(path).map_err(|source| Error::DeviceNode {
            path: path.to_path_buf(),
            major: FakeDriConfig::DEV_NULL_MAJOR,
            minor: FakeDriConfig::DEV_NULL_MINOR,
            source,
        })?;
        self.stats.devices += 1;
        Ok(())
    }

    pub fn finish(self, device: usize, step: BuildStep, result: Result<()>) -> StepOutcome {
        StepOutcome {
            device,
            step,
            created: self.stats,
            result,
        }
    }
}

/// Remove everything below and including `path`, ignoring a missing path.
pub(crate) fn remove_tree(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
