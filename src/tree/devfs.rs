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

use super::sysfs::add_device_nodes;
use super::{BuildStep, StepOutcome, TreeWriter};
use crate::common::config::DeviceNaming;
use crate::error::Result;
use crate::generator::RunContext;

/// Build `dri/cardX`, `dri/renderD1XX` and their `dri/by-path` links.
pub fn build_devfs_subtree(ctx: &RunContext, index: usize) -> StepOutcome {
    let mut writer = TreeWriter::new();
    let result = devfs_subtree(&mut writer, ctx, index);
    writer.finish(index, BuildStep::Devfs, result)
}

fn devfs_subtree(writer: &mut TreeWriter, ctx: &RunContext, index: usize) -> Result<()> {
    let dri = ctx.devfs_root.join("dri");
    // Shared by all devices, only the first one creates it.
    writer.create_dir_all(&dri.join("by-path"))?;

    add_device_nodes(writer, &dri, index)?;

    let prefix = DeviceNaming::by_path_prefix(index);
    let by_path = dri.join("by-path");
    writer.symlink(
        &format!("../{}", DeviceNaming::card(index)),
        &by_path.join(format!("{prefix}-card")),
    )?;
    writer.symlink(
        &format!("../{}", DeviceNaming::render(index)),
        &by_path.join(format!("{prefix}-render")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GenerationOptions;
    use crate::tree::device_node::is_char_device;
    use std::fs;
    use std::path::Path;

    fn context(root: &Path) -> RunContext {
        let opts = GenerationOptions {
            driver: "i915".to_string(),
            device_count: 2,
            ..Default::default()
        };
        RunContext::new(opts, root.join("sys"), root.join("dev"))
    }

    #[test]
    fn test_devfs_nodes_and_links() {
        let tmp = tempfile::tempdir().unwrap();
        crate::skip_without_mknod!(tmp.path());
        let ctx = context(tmp.path());

        let first = build_devfs_subtree(&ctx, 0);
        let second = build_devfs_subtree(&ctx, 1);
        assert!(first.is_ok(), "{:?}", first.result);
        assert!(second.is_ok(), "{:?}", second.result);

        let dri = ctx.devfs_root.join("dri");
        for name in ["card0", "card1", "renderD128", "renderD129"] {
            assert!(is_char_device(&dri.join(name)), "{name}");
        }
        assert_eq!(
            fs::read_link(dri.join("by-path/pci-0000:01:02.0-card")).unwrap(),
            Path::new("../card1")
        );
        assert_eq!(
            fs::read_link(dri.join("by-path/pci-0000:01:02.0-render")).unwrap(),
            Path::new("../renderD129")
        );

        // by-path is created once
        assert_eq!(first.created.dirs, 1);
        assert_eq!(second.created.dirs, 0);
        assert_eq!(first.created.devices, 2);
        assert_eq!(first.created.symlinks, 2);
    }

    #[test]
    fn test_devfs_without_privileges_reports_node_failure() {
        let tmp = tempfile::tempdir().unwrap();
        if crate::tree::device_node::can_create_device_nodes(tmp.path()) {
            return;
        }
        let ctx = context(tmp.path());

        let outcome = build_devfs_subtree(&ctx, 0);
        assert!(matches!(
            outcome.result,
            Err(crate::error::Error::DeviceNode { .. })
        ));
        assert!(ctx.devfs_root.join("dri/by-path").is_dir());
        assert_eq!(outcome.created.symlinks, 0);
    }
}
