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

//! Per-device tree construction.
//!
//! Each builder materializes one part of a device's on-disk shape and
//! returns a [`StepOutcome`] holding what it created and whether it
//! finished. Builders never share counters; the orchestrator sums them.

mod debugfs;
mod devfs;
pub mod device_node;
mod root;
mod sysfs;
mod writer;

use std::fmt;
use std::ops::AddAssign;

use crate::error::Result;

pub use debugfs::build_debugfs_subtree;
pub use devfs::build_devfs_subtree;
pub use root::{reset_root, RootKind, RootReset};
pub use sysfs::{build_bus_subtree, build_drm_subtree};
pub use writer::TreeWriter;

/// Counts of filesystem entries created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub dirs: usize,
    pub files: usize,
    pub devices: usize,
    pub symlinks: usize,
}

impl AddAssign for GenerationStats {
    fn add_assign(&mut self, rhs: Self) {
        self.dirs += rhs.dirs;
        self.files += rhs.files;
        self.devices += rhs.devices;
        self.symlinks += rhs.symlinks;
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dirs, {} devices, {} files and {} symlinks",
            self.dirs, self.devices, self.files, self.symlinks
        )
    }
}

/// The four per-device build steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
    SysfsBus,
    SysfsDrm,
    Devfs,
    Debugfs,
}

impl BuildStep {
    pub const ALL: [BuildStep; 4] = [
        BuildStep::SysfsBus,
        BuildStep::SysfsDrm,
        BuildStep::Devfs,
        BuildStep::Debugfs,
    ];
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStep::SysfsBus => "sysfs bus tree",
            BuildStep::SysfsDrm => "sysfs tree",
            BuildStep::Devfs => "devfs tree",
            BuildStep::Debugfs => "debugfs tree",
        };
        f.write_str(name)
    }
}

/// Result of one build step for one device.
///
/// `created` is accurate even when `result` is an error: it counts what
/// was made before the failure.
#[derive(Debug)]
pub struct StepOutcome {
    pub device: usize,
    pub step: BuildStep,
    pub created: GenerationStats,
    pub result: Result<()>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
