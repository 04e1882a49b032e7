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

//! Run orchestration: reset roots, build every device, publish topology.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::common::config::FakeDriConfig;
use crate::error::{Error, Result};
use crate::options::GenerationOptions;
use crate::sidecar::{chunk_labels, write_sidecar};
use crate::topology::TopologySource;
use crate::tree::{
    build_bus_subtree, build_debugfs_subtree, build_devfs_subtree, build_drm_subtree,
    reset_root, BuildStep, GenerationStats, RootKind, RootReset, StepOutcome,
};

/// What to do after a build step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log it and carry on with the next step and device.
    #[default]
    Continue,
    /// Stop building devices. Topology is still published.
    Abort,
}

/// Everything a run needs, passed by reference to every builder.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub options: GenerationOptions,
    pub sysfs_root: PathBuf,
    pub devfs_root: PathBuf,
    /// `None` disables the sidecar label file.
    pub sidecar_path: Option<PathBuf>,
    pub failure_policy: FailurePolicy,
}

impl RunContext {
    /// Context with the given roots, no sidecar and the default policy.
    pub fn new(options: GenerationOptions, sysfs_root: PathBuf, devfs_root: PathBuf) -> Self {
        Self {
            options,
            sysfs_root,
            devfs_root,
            sidecar_path: None,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_sidecar(mut self, path: PathBuf) -> Self {
        self.sidecar_path = Some(path);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

impl From<GenerationOptions> for RunContext {
    /// Context with the default `/tmp` roots and sidecar location.
    fn from(options: GenerationOptions) -> Self {
        RunContext::new(
            options,
            PathBuf::from(FakeDriConfig::DEFAULT_SYSFS_ROOT),
            PathBuf::from(FakeDriConfig::DEFAULT_DEVFS_ROOT),
        )
        .with_sidecar(PathBuf::from(FakeDriConfig::DEFAULT_SIDECAR_PATH))
    }
}

/// Outcome of the sidecar stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarOutcome {
    /// No sidecar path configured.
    Disabled,
    /// The capabilities ask for no topology, or it encoded to nothing.
    Skipped,
    CreateFailed { reason: String },
    Written { path: PathBuf, lines: usize },
}

/// Everything a run did, for logging and for tests.
#[derive(Debug)]
pub struct GenerationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub devfs_reset: RootReset,
    pub sysfs_reset: RootReset,
    pub outcomes: Vec<StepOutcome>,
    pub stats: GenerationStats,
    /// Set when [`FailurePolicy::Abort`] stopped the device loop early.
    pub aborted: bool,
    pub sidecar: SidecarOutcome,
}

impl GenerationReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn is_complete(&self) -> bool {
        !self.aborted && self.failures().next().is_none()
    }
}

type StepFn = fn(&RunContext, usize) -> StepOutcome;

fn step_builder(step: BuildStep) -> StepFn {
    match step {
        BuildStep::SysfsBus => build_bus_subtree,
        BuildStep::SysfsDrm => build_drm_subtree,
        BuildStep::Devfs => build_devfs_subtree,
        BuildStep::Debugfs => build_debugfs_subtree,
    }
}

/// Build every device in ascending order. Returns the outcomes and whether
/// the loop was cut short.
pub fn build_devices(ctx: &RunContext) -> (Vec<StepOutcome>, bool) {
    let capacity = ctx.options.device_count.min(FakeDriConfig::MAX_DEVICES) * BuildStep::ALL.len();
    let mut outcomes = Vec::with_capacity(capacity);

    for index in 0..ctx.options.device_count {
        for step in BuildStep::ALL {
            let outcome = step_builder(step)(ctx, index);
            let failed = match &outcome.result {
                Ok(()) => false,
                Err(e) => {
                    error!("Dev-{index} {step} generation failed: {e}");
                    true
                }
            };
            outcomes.push(outcome);
            if failed && ctx.failure_policy == FailurePolicy::Abort {
                return (outcomes, true);
            }
        }
    }
    (outcomes, false)
}

/// Encode the topology and write the label file.
///
/// Only a write failure on an already opened file is an error.
pub fn publish_topology(ctx: &RunContext) -> Result<SidecarOutcome> {
    let Some(path) = &ctx.sidecar_path else {
        return Ok(SidecarOutcome::Disabled);
    };
    let Some(source) = TopologySource::select(&ctx.options) else {
        return Ok(SidecarOutcome::Skipped);
    };
    let topology = source.encode();
    if topology.is_empty() {
        return Ok(SidecarOutcome::Skipped);
    }

    let lines = chunk_labels(&topology);
    match write_sidecar(path, &lines) {
        Ok(()) => {}
        Err(Error::SidecarCreate { source, .. }) => {
            error!("Failed to create file: {source}");
            return Ok(SidecarOutcome::CreateFailed {
                reason: source.to_string(),
            });
        }
        Err(e) => return Err(e),
    }

    debug!(
        "XELINK: generated xelink sidecar label file, using (GPUs: {}, Tiles: {}, Topology: {source})",
        ctx.options.device_count,
        ctx.options.tiles_per_device.get()
    );
    Ok(SidecarOutcome::Written {
        path: path.clone(),
        lines: lines.len(),
    })
}

/// Generate the whole fake tree described by `ctx`.
///
/// Filesystem failures are reported in the returned report, never as an
/// error. The only error is [`Error::SidecarWrite`].
pub fn generate(ctx: &RunContext) -> Result<GenerationReport> {
    let started_at = Utc::now();
    let opts = &ctx.options;
    if !opts.info.is_empty() {
        debug!("Config: '{}'", opts.info);
    }
    debug!("Driver: '{}', mode: '{}'", opts.driver, opts.mode);

    let devfs_reset = reset_root(&ctx.devfs_root, RootKind::Devfs);
    let sysfs_reset = reset_root(&ctx.sysfs_root, RootKind::Sysfs);
    debug!(
        "Generating fake DRI device(s) sysfs, debugfs and devfs content under '{}' & '{}'",
        ctx.sysfs_root.display(),
        ctx.devfs_root.display()
    );

    let (outcomes, aborted) = build_devices(ctx);
    let mut stats = GenerationStats::default();
    for outcome in &outcomes {
        stats += outcome.created;
    }
    if aborted {
        error!("Stopped after the first failed step, as requested");
    }
    info!("Done, created {stats}.");

    let sidecar = publish_topology(ctx)?;

    let finished_at = Utc::now();
    debug!(
        "Generation took {} ms",
        (finished_at - started_at).num_milliseconds()
    );

    Ok(GenerationReport {
        started_at,
        finished_at,
        devfs_reset,
        sysfs_reset,
        outcomes,
        stats,
        aborted,
        sidecar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Fanout;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn options(devices: usize) -> GenerationOptions {
        GenerationOptions {
            driver: "i915".to_string(),
            device_count: devices,
            device_memory_bytes: 1024 * 1024,
            ..Default::default()
        }
    }

    fn context(root: &Path, opts: GenerationOptions) -> RunContext {
        RunContext::new(opts, root.join("sys"), root.join("dev"))
    }

    #[test]
    fn test_default_context_paths() {
        let ctx = RunContext::from(options(1));
        assert_eq!(ctx.sysfs_root, Path::new("/tmp/sys"));
        assert_eq!(ctx.devfs_root, Path::new("/tmp/dev"));
        assert_eq!(
            ctx.sidecar_path.as_deref(),
            Some(Path::new(
                "/etc/kubernetes/node-feature-discovery/features.d/xpum-sidecar-labels.txt"
            ))
        );
        assert_eq!(ctx.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_every_step_runs_for_every_device() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), options(3));

        let (outcomes, aborted) = build_devices(&ctx);
        assert!(!aborted);
        assert_eq!(outcomes.len(), 12);
        let order: Vec<_> = outcomes.iter().map(|o| (o.device, o.step)).collect();
        assert_eq!(order[0], (0, BuildStep::SysfsBus));
        assert_eq!(order[3], (0, BuildStep::Debugfs));
        assert_eq!(order[4], (1, BuildStep::SysfsBus));
        assert_eq!(order[11], (2, BuildStep::Debugfs));

        // drm and debugfs need no privileges
        for o in &outcomes {
            if matches!(o.step, BuildStep::SysfsDrm | BuildStep::Debugfs) {
                assert!(o.is_ok(), "{:?}", o.result);
            }
        }
    }

    #[test]
    fn test_abort_policy_stops_at_first_failure() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the sysfs root should be breaks every sysfs step.
        std::fs::write(tmp.path().join("sys"), "").unwrap();
        let ctx = context(tmp.path(), options(4)).with_failure_policy(FailurePolicy::Abort);

        let (outcomes, aborted) = build_devices(&ctx);
        assert!(aborted);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].step, BuildStep::SysfsBus);

        let ctx = ctx.with_failure_policy(FailurePolicy::Continue);
        let (outcomes, aborted) = build_devices(&ctx);
        assert!(!aborted);
        assert_eq!(outcomes.len(), 16);
    }

    #[test]
    fn test_huge_device_count_aborts_cleanly() {
        let raw = crate::options::parse_yaml(
            "DevCount: 9223372036854775807\nDriver: i915\nDevMemSize: 1048576",
        )
        .unwrap();
        let opts = crate::options::validate(raw)
            .into_options(crate::options::ValidationPolicy::Permissive)
            .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("sys"), "").unwrap();
        let ctx = context(tmp.path(), opts).with_failure_policy(FailurePolicy::Abort);

        let (outcomes, aborted) = build_devices(&ctx);
        assert!(aborted);
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].is_ok());
    }

    #[test]
    fn test_publish_topology_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let sidecar = tmp.path().join("labels.txt");

        let mut opts = options(2);
        opts.tiles_per_device = Fanout::from_count(1);
        opts.capabilities = BTreeMap::from([(
            "connection-topology".to_string(),
            "FULL".to_string(),
        )]);

        let ctx = context(tmp.path(), opts.clone());
        assert_eq!(publish_topology(&ctx).unwrap(), SidecarOutcome::Disabled);

        let ctx = ctx.with_sidecar(sidecar.clone());
        assert_eq!(
            publish_topology(&ctx).unwrap(),
            SidecarOutcome::Written {
                path: sidecar.clone(),
                lines: 1
            }
        );
        assert_eq!(
            std::fs::read_to_string(&sidecar).unwrap(),
            "xpumanager.intel.com/xe-links=1.0-0.0\n"
        );

        opts.capabilities.clear();
        let ctx = context(tmp.path(), opts.clone()).with_sidecar(sidecar.clone());
        assert_eq!(publish_topology(&ctx).unwrap(), SidecarOutcome::Skipped);

        opts.capabilities
            .insert("connections".to_string(), "0.0-1.0".to_string());
        let ctx = context(tmp.path(), opts).with_sidecar(tmp.path().join("no/such/dir"));
        assert!(matches!(
            publish_topology(&ctx).unwrap(),
            SidecarOutcome::CreateFailed { .. }
        ));
    }

    #[test]
    fn test_generate_sums_stats() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), options(2));

        let report = generate(&ctx).unwrap();
        let mut expected = GenerationStats::default();
        for o in &report.outcomes {
            expected += o.created;
        }
        assert_eq!(report.stats, expected);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(report.sidecar, SidecarOutcome::Disabled);
        assert_eq!(report.devfs_reset, RootReset::Untouched);
    }
}
