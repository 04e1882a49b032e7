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

/// Layout and numbering constants of the generated tree
pub struct FakeDriConfig;

impl FakeDriConfig {
    // Permissions
    pub const DIR_MODE: u32 = 0o775;
    pub const FILE_MODE: u32 = 0o644;

    // Device numbering
    pub const CARD_BASE: usize = 0;
    pub const RENDER_BASE: usize = 128;
    pub const MAX_DEVICES: usize = 128;

    // Default roots
    pub const DEFAULT_SYSFS_ROOT: &'static str = "/tmp/sys";
    pub const DEFAULT_DEVFS_ROOT: &'static str = "/tmp/dev";

    pub const MIB: u64 = 1024 * 1024;

    // Every device node is a /dev/null alias
    pub const DEV_NULL_MAJOR: u32 = 1;
    pub const DEV_NULL_MINOR: u32 = 3;

    // Attribute values
    pub const PCI_VENDOR_INTEL: &'static str = "0x8086";
    pub const PCI_DEVICE_ID: &'static str = "0x4905";

    // Capability keys that drive the xelink topology
    pub const CAP_CONNECTION_TOPOLOGY: &'static str = "connection-topology";
    pub const CAP_CONNECTIONS: &'static str = "connections";
    pub const FULLY_CONNECTED: &'static str = "FULL";

    // Node feature discovery sidecar
    pub const MAX_LABEL_LEN: usize = 63;
    pub const XELINK_LABEL_KEY: &'static str = "xpumanager.intel.com/xe-links";
    pub const CONTINUATION_MARK: char = 'Z';
    pub const DEFAULT_SIDECAR_PATH: &'static str =
        "/etc/kubernetes/node-feature-discovery/features.d/xpum-sidecar-labels.txt";

    // Root reset heuristics
    pub const MAX_FAKE_SYSFS_ENTRIES: usize = 3;
    pub const FAKE_DEVFS_ENTRY: &'static str = "dri";
}

/// Device numbering helpers
pub struct DeviceNaming;

impl DeviceNaming {
    pub fn card(index: usize) -> String {
        format!("card{}", FakeDriConfig::CARD_BASE + index)
    }

    pub fn render(index: usize) -> String {
        format!("renderD{}", FakeDriConfig::RENDER_BASE + index)
    }

    /// Bus address of the PCI driver entry. Indices above 9 keep the
    /// extra digit, matching the layout consumers were written against.
    pub fn pci_address(index: usize) -> String {
        format!("0000:00:0{index}.0")
    }

    pub fn by_path_prefix(index: usize) -> String {
        format!("pci-0000:{index:02}:02.0")
    }
}
