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

use std::io::Write;

use super::{BuildStep, StepOutcome, TreeWriter};
use crate::error::{Error, Result};
use crate::generator::RunContext;

pub const CAPABILITIES_FILE: &str = "i915_capabilities";

/// Build `kernel/debug/dri/X/i915_capabilities` below the sysfs root.
pub fn build_debugfs_subtree(ctx: &RunContext, index: usize) -> StepOutcome {
    let mut writer = TreeWriter::new();
    let result = debugfs_subtree(&mut writer, ctx, index);
    writer.finish(index, BuildStep::Debugfs, result)
}

fn debugfs_subtree(writer: &mut TreeWriter, ctx: &RunContext, index: usize) -> Result<()> {
    let base = ctx
        .sysfs_root
        .join("kernel/debug/dri")
        .join(index.to_string());
    writer.create_dir_all(&base)?;

    let path = base.join(CAPABILITIES_FILE);
    let mut file = writer.create_new_file(&path)?;
    for (key, value) in &ctx.options.capabilities {
        writeln!(file, "{key}: {value}").map_err(|source| Error::WriteFile {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GenerationOptions;
    use std::collections::BTreeMap;
    use std::fs;

    fn context(root: &std::path::Path) -> RunContext {
        let capabilities = BTreeMap::from([
            ("platform".to_string(), "fake_DG1".to_string()),
            ("connection-topology".to_string(), "FULL".to_string()),
        ]);
        let opts = GenerationOptions {
            capabilities,
            device_count: 1,
            ..Default::default()
        };
        RunContext::new(opts, root.join("sys"), root.join("dev"))
    }

    #[test]
    fn test_capabilities_file_lists_every_key() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());

        let outcome = build_debugfs_subtree(&ctx, 0);
        assert!(outcome.is_ok(), "{:?}", outcome.result);

        let content =
            fs::read_to_string(ctx.sysfs_root.join("kernel/debug/dri/0/i915_capabilities"))
                .unwrap();
        let mut lines: Vec<_> = content.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["connection-topology: FULL", "platform: fake_DG1"]);
        assert_eq!(outcome.created.dirs, 1);
        assert_eq!(outcome.created.files, 1);
    }

    #[test]
    fn test_capabilities_file_must_not_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());

        assert!(build_debugfs_subtree(&ctx, 0).is_ok());
        let again = build_debugfs_subtree(&ctx, 0);
        assert!(matches!(again.result, Err(Error::WriteFile { .. })));
        assert_eq!(again.created.files, 0);
    }
}
