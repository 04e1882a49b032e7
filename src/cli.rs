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

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};

use crate::common::config::FakeDriConfig;
use crate::error::Result;
use crate::generator::{FailurePolicy, RunContext};
use crate::options::{self, GenerationOptions, RawGenOptions, ValidationPolicy};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate fake sysfs, devfs and debugfs trees for Intel GPUs",
    long_about = None
)]
#[command(group(
    ArgGroup::new("spec")
        .required(true)
        .args(["json", "yaml", "yaml_file"])
))]
pub struct Cli {
    /// JSON file describing the fake devices.
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Inline YAML spec describing the fake devices.
    #[arg(long, value_name = "SPEC")]
    pub yaml: Option<String>,

    /// YAML file describing the fake devices.
    #[arg(long, value_name = "FILE")]
    pub yaml_file: Option<PathBuf>,

    /// Root of the generated sysfs (and debugfs) tree.
    #[arg(long, default_value = FakeDriConfig::DEFAULT_SYSFS_ROOT)]
    pub sysfs_root: PathBuf,

    /// Root of the generated devfs tree.
    #[arg(long, default_value = FakeDriConfig::DEFAULT_DEVFS_ROOT)]
    pub devfs_root: PathBuf,

    /// Where to write the Xe Link node feature discovery labels.
    #[arg(long, default_value = FakeDriConfig::DEFAULT_SIDECAR_PATH)]
    pub sidecar_path: PathBuf,

    /// Do not write the sidecar label file.
    #[arg(long)]
    pub no_sidecar: bool,

    /// Refuse to generate when the spec breaks an invariant.
    #[arg(long)]
    pub strict: bool,

    /// Stop at the first failed build step instead of continuing.
    #[arg(long)]
    pub fail_fast: bool,

    /// Log generation progress. Ignored when RUST_LOG is set.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Load the raw spec from whichever source was given.
    pub fn load_raw(&self) -> Result<RawGenOptions> {
        if let Some(path) = &self.json {
            options::load_json_file(path)
        } else if let Some(path) = &self.yaml_file {
            options::load_yaml_file(path)
        } else {
            options::parse_yaml(self.yaml.as_deref().unwrap_or_default())
        }
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        if self.strict {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Permissive
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        }
    }

    /// Default log filter when RUST_LOG is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "fake_dri=info",
            1 => "fake_dri=debug",
            _ => "fake_dri=trace",
        }
    }

    pub fn run_context(&self, options: GenerationOptions) -> RunContext {
        let ctx = RunContext::new(options, self.sysfs_root.clone(), self.devfs_root.clone())
            .with_failure_policy(self.failure_policy());
        if self.no_sidecar {
            ctx
        } else {
            ctx.with_sidecar(self.sidecar_path.clone())
        }
    }
}
