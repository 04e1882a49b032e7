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

//! Generation options for the fake device tree.
//!
//! Options arrive as a [`RawGenOptions`] record deserialized from JSON or
//! YAML, then pass through [`validate`] which converts them into the typed
//! [`GenerationOptions`] and collects every invariant violation.

mod loader;
mod validate;

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::common::config::FakeDriConfig;

pub use loader::{load_json_file, load_yaml_file, parse_json, parse_yaml};
pub use validate::{validate, OptionViolation, Validated, ValidationPolicy};

/// Raw configuration record as written in the spec files.
///
/// All fields are optional and integers are signed so that bad input
/// reaches the validator instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawGenOptions {
    pub capabilities: BTreeMap<String, String>,
    pub info: String,
    pub driver: String,
    pub mode: String,
    pub path: String,
    pub dev_count: i64,
    pub tiles_per_dev: i64,
    pub dev_mem_size: i64,
    pub devs_per_node: i64,
    pub vfs_per_pf: i64,
}

/// A per-device fan-out knob where zero means the feature is not faked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fanout {
    #[default]
    Disabled,
    Count(NonZeroUsize),
}

impl Fanout {
    pub fn from_count(count: usize) -> Self {
        NonZeroUsize::new(count).map_or(Fanout::Disabled, Fanout::Count)
    }

    /// The configured count, or 0 when disabled.
    pub fn get(self) -> usize {
        match self {
            Fanout::Disabled => 0,
            Fanout::Count(n) => n.get(),
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Fanout::Count(_))
    }
}

/// Validated options, read-only for the rest of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    pub capabilities: BTreeMap<String, String>,
    pub info: String,
    pub driver: String,
    pub mode: String,
    pub path: String,
    pub device_count: usize,
    pub tiles_per_device: Fanout,
    pub device_memory_bytes: u64,
    pub devices_per_numa_node: Fanout,
    pub vfs_per_pf: Fanout,
}

impl GenerationOptions {
    /// NUMA node a device belongs to.
    pub fn numa_node(&self, index: usize) -> usize {
        match self.devices_per_numa_node {
            Fanout::Disabled => 0,
            Fanout::Count(per_node) => index / per_node.get(),
        }
    }

    /// Whether `index` is the physical function of its PF+VF group.
    pub fn is_physical_function(&self, index: usize) -> bool {
        match self.vfs_per_pf {
            Fanout::Disabled => false,
            Fanout::Count(vfs) => vfs
                .get()
                .checked_add(1)
                .map_or(index == 0, |group| index % group == 0),
        }
    }

    pub fn capability(&self, key: &str) -> Option<&str> {
        self.capabilities.get(key).map(String::as_str)
    }

    /// Whether the capabilities request a fully connected xelink mesh.
    pub fn wants_full_mesh(&self) -> bool {
        self.capability(FakeDriConfig::CAP_CONNECTION_TOPOLOGY)
            == Some(FakeDriConfig::FULLY_CONNECTED)
    }
}
