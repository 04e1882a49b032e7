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

//! Sysfs side of a fake device.
//!
//! ```text
//! class/drm/cardX/lmem_total_bytes
//! class/drm/cardX/device/{vendor,numa_node,sriov_numvfs,driver}
//! class/drm/cardX/device/drm/{cardX,renderD1XX}/
//! class/drm/cardX/gt/gtN/
//! bus/pci/drivers/<driver>/0000:00:0X.0/{device,drm/cardX,drm/renderD1XX}
//! ```

use std::path::Path;

use super::{BuildStep, StepOutcome, TreeWriter};
use crate::common::config::{DeviceNaming, FakeDriConfig};
use crate::error::Result;
use crate::generator::RunContext;

/// Build the PCI driver entry for device `index`, including its DRM nodes.
pub fn build_bus_subtree(ctx: &RunContext, index: usize) -> StepOutcome {
    let mut writer = TreeWriter::new();
    let result = bus_subtree(&mut writer, ctx, index);
    writer.finish(index, BuildStep::SysfsBus, result)
}

/// Build `class/drm/cardX` for device `index`.
pub fn build_drm_subtree(ctx: &RunContext, index: usize) -> StepOutcome {
    let mut writer = TreeWriter::new();
    let result = drm_subtree(&mut writer, ctx, index);
    writer.finish(index, BuildStep::SysfsDrm, result)
}

fn bus_subtree(writer: &mut TreeWriter, ctx: &RunContext, index: usize) -> Result<()> {
    let base = ctx
        .sysfs_root
        .join("bus/pci/drivers")
        .join(&ctx.options.driver)
        .join(DeviceNaming::pci_address(index));
    writer.create_dir_all(&base)?;
    writer.write_file(&base.join("device"), FakeDriConfig::PCI_DEVICE_ID)?;

    let drm = base.join("drm");
    writer.create_dir_all(&drm)?;
    add_device_nodes(writer, &drm, index)
}

fn drm_subtree(writer: &mut TreeWriter, ctx: &RunContext, index: usize) -> Result<()> {
    let opts = &ctx.options;
    let card = DeviceNaming::card(index);
    let base = ctx.sysfs_root.join("class/drm").join(&card);

    writer.create_dir_all(&base)?;
    writer.write_file(
        &base.join("lmem_total_bytes"),
        &opts.device_memory_bytes.to_string(),
    )?;

    let device = base.join("device");
    writer.create_dir_all(&device.join("drm").join(&card))?;
    writer.create_dir(&device.join("drm").join(DeviceNaming::render(index)))?;

    writer.symlink(
        &format!("../../../../bus/pci/drivers/{}", opts.driver),
        &device.join("driver"),
    )?;
    writer.write_file(&device.join("vendor"), FakeDriConfig::PCI_VENDOR_INTEL)?;
    writer.write_file(
        &device.join("numa_node"),
        &opts.numa_node(index).to_string(),
    )?;

    if opts.is_physical_function(index) {
        writer.write_file(
            &device.join("sriov_numvfs"),
            &opts.vfs_per_pf.get().to_string(),
        )?;
    }

    for tile in 0..opts.tiles_per_device.get() {
        writer.create_dir_all(&base.join("gt").join(format!("gt{tile}")))?;
    }

    Ok(())
}

/// Create the card and render nodes for `index` inside `dir`.
pub(super) fn add_device_nodes(writer: &mut TreeWriter, dir: &Path, index: usize) -> Result<()> {
    writer.null_device(&dir.join(DeviceNaming::card(index)))?;
    writer.null_device(&dir.join(DeviceNaming::render(index)))
}
