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

use thiserror::Error;
use tracing::warn;

use super::{Fanout, GenerationOptions, RawGenOptions};
use crate::common::config::FakeDriConfig;
use crate::error::{Error, Result};

/// A single broken invariant found in the raw options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionViolation {
    #[error("Invalid device count: 1 <= {count} <= {max}")]
    DeviceCountOutOfRange { count: i64, max: usize },

    #[error("Invalid memory size ({:.3} MiB), not even MiB", as_mib(.bytes))]
    MemoryNotMibAligned { bytes: i64 },

    #[error("SR-IOV VFs ({vfs}) with device tiles ({tiles}) or Numa nodes ({numa}) is unsupported for faking")]
    SriovWithTilesOrNuma { vfs: usize, tiles: usize, numa: usize },

    #[error("{devices} devices cannot be evenly split to between set of 1 SR-IOV PF + {vfs} VFs")]
    UnevenSriovSplit { devices: usize, vfs: usize },

    #[error("DevsPerNode ({per_node}) > DevCount ({devices})")]
    NumaNodeExceedsDevices { per_node: usize, devices: usize },

    #[error("{field} ({value}) is negative, treating it as 0")]
    Negative { field: &'static str, value: i64 },
}

fn as_mib(bytes: &i64) -> f64 {
    *bytes as f64 / FakeDriConfig::MIB as f64
}

/// What to do with options that break an invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Warn and generate with the values as given.
    #[default]
    Permissive,
    /// Refuse to generate.
    Strict,
}

/// Converted options together with every violation found.
#[derive(Debug, Clone)]
pub struct Validated {
    pub options: GenerationOptions,
    pub violations: Vec<OptionViolation>,
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Apply `policy` to the collected violations.
    pub fn into_options(self, policy: ValidationPolicy) -> Result<GenerationOptions> {
        match policy {
            ValidationPolicy::Strict if !self.violations.is_empty() => {
                Err(Error::InvalidOptions(self.violations))
            }
            _ => Ok(self.options),
        }
    }
}

fn non_negative(
    field: &'static str,
    value: i64,
    violations: &mut Vec<OptionViolation>,
) -> usize {
    if value < 0 {
        violations.push(OptionViolation::Negative { field, value });
        return 0;
    }
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Convert raw options and check them. Never fails; every violation is
/// logged as a warning and returned alongside the options.
pub fn validate(raw: RawGenOptions) -> Validated {
    let mut violations = Vec::new();

    if raw.dev_count < 1 || raw.dev_count > FakeDriConfig::MAX_DEVICES as i64 {
        violations.push(OptionViolation::DeviceCountOutOfRange {
            count: raw.dev_count,
            max: FakeDriConfig::MAX_DEVICES,
        });
    }
    let device_count = non_negative("DevCount", raw.dev_count, &mut violations);
    let tiles = non_negative("TilesPerDev", raw.tiles_per_dev, &mut violations);
    let numa = non_negative("DevsPerNode", raw.devs_per_node, &mut violations);
    let vfs = non_negative("VfsPerPf", raw.vfs_per_pf, &mut violations);
    let memory = non_negative("DevMemSize", raw.dev_mem_size, &mut violations) as u64;

    if vfs > 0 {
        if tiles > 0 || numa > 0 {
            violations.push(OptionViolation::SriovWithTilesOrNuma { vfs, tiles, numa });
        }
        let uneven = match vfs.checked_add(1) {
            Some(group) => device_count % group != 0,
            None => device_count != 0,
        };
        if uneven {
            violations.push(OptionViolation::UnevenSriovSplit {
                devices: device_count,
                vfs,
            });
        }
    }

    if numa > device_count {
        violations.push(OptionViolation::NumaNodeExceedsDevices {
            per_node: numa,
            devices: device_count,
        });
    }

    if raw.dev_mem_size % FakeDriConfig::MIB as i64 != 0 {
        violations.push(OptionViolation::MemoryNotMibAligned {
            bytes: raw.dev_mem_size,
        });
    }

    for violation in &violations {
        warn!("{violation}");
    }

    Validated {
        options: GenerationOptions {
            capabilities: raw.capabilities,
            info: raw.info,
            driver: raw.driver,
            mode: raw.mode,
            path: raw.path,
            device_count,
            tiles_per_device: Fanout::from_count(tiles),
            device_memory_bytes: memory,
            devices_per_numa_node: Fanout::from_count(numa),
            vfs_per_pf: Fanout::from_count(vfs),
        },
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(count: i64) -> RawGenOptions {
        RawGenOptions {
            driver: "i915".to_string(),
            dev_count: count,
            dev_mem_size: 4 * FakeDriConfig::MIB as i64,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_options_pass_through() {
        let mut r = raw(4);
        r.tiles_per_dev = 2;
        r.devs_per_node = 2;
        let v = validate(r);
        assert!(v.is_valid(), "{:?}", v.violations);
        assert_eq!(v.options.device_count, 4);
        assert_eq!(v.options.tiles_per_device.get(), 2);
        assert_eq!(v.options.devices_per_numa_node.get(), 2);
        assert_eq!(v.options.vfs_per_pf, Fanout::Disabled);
        assert_eq!(v.options.device_memory_bytes, 4 * FakeDriConfig::MIB);
    }

    #[test]
    fn test_device_count_bounds() {
        assert!(validate(raw(1)).is_valid());
        assert!(validate(raw(128)).is_valid());

        let v = validate(raw(0));
        assert_eq!(
            v.violations,
            vec![OptionViolation::DeviceCountOutOfRange { count: 0, max: 128 }]
        );

        let v = validate(raw(129));
        assert_eq!(v.violations.len(), 1);
        // Permissive: the value is kept.
        assert_eq!(v.options.device_count, 129);
    }

    #[test]
    fn test_memory_alignment() {
        let mut r = raw(1);
        r.dev_mem_size = 1024 * 1024 + 1;
        let v = validate(r);
        assert_eq!(
            v.violations,
            vec![OptionViolation::MemoryNotMibAligned {
                bytes: 1024 * 1024 + 1
            }]
        );
        assert_eq!(v.options.device_memory_bytes, 1024 * 1024 + 1);
    }

    #[test]
    fn test_sriov_excludes_tiles_and_numa() {
        let mut r = raw(4);
        r.vfs_per_pf = 1;
        r.tiles_per_dev = 2;
        let v = validate(r);
        assert!(v.violations.contains(&OptionViolation::SriovWithTilesOrNuma {
            vfs: 1,
            tiles: 2,
            numa: 0
        }));
    }

    #[test]
    fn test_sriov_uneven_split() {
        let mut r = raw(4);
        r.vfs_per_pf = 1;
        assert!(validate(r.clone()).is_valid());

        r.vfs_per_pf = 2;
        let v = validate(r);
        assert_eq!(
            v.violations,
            vec![OptionViolation::UnevenSriovSplit { devices: 4, vfs: 2 }]
        );
    }

    #[test]
    fn test_huge_values_do_not_overflow() {
        let mut r = raw(i64::MAX);
        r.vfs_per_pf = i64::MAX;
        let v = validate(r);
        assert!(!v.is_valid());
        assert!(v
            .violations
            .iter()
            .any(|e| matches!(e, OptionViolation::UnevenSriovSplit { .. })));
    }

    #[test]
    fn test_numa_exceeds_devices() {
        let mut r = raw(2);
        r.devs_per_node = 3;
        let v = validate(r);
        assert_eq!(
            v.violations,
            vec![OptionViolation::NumaNodeExceedsDevices {
                per_node: 3,
                devices: 2
            }]
        );
    }

    #[test]
    fn test_negative_values_become_disabled() {
        let mut r = raw(2);
        r.tiles_per_dev = -1;
        let v = validate(r);
        assert_eq!(
            v.violations,
            vec![OptionViolation::Negative {
                field: "TilesPerDev",
                value: -1
            }]
        );
        assert_eq!(v.options.tiles_per_device, Fanout::Disabled);
    }

    #[test]
    fn test_policy() {
        let v = validate(raw(0));
        assert!(v.clone().into_options(ValidationPolicy::Permissive).is_ok());
        match v.into_options(ValidationPolicy::Strict) {
            Err(Error::InvalidOptions(violations)) => assert_eq!(violations.len(), 1),
            other => panic!("expected InvalidOptions, got {other:?}"),
        }

        let v = validate(raw(2));
        assert!(v.into_options(ValidationPolicy::Strict).is_ok());
    }
}
