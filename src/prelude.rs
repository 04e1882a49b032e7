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

//! The fake-dri prelude.
//!
//! ```rust
//! use fake_dri::prelude::*;
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use fake_dri::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let raw = parse_yaml("DevCount: 2\nDriver: i915\nDevMemSize: 1048576")?;
//!     let options = validate(raw).into_options(ValidationPolicy::Strict)?;
//!     let report = generate(&RunContext::from(options))?;
//!     println!("created {}", report.stats);
//!     Ok(())
//! }
//! ```

// Options
pub use crate::options::{
    load_json_file, load_yaml_file, parse_json, parse_yaml, validate, Fanout, GenerationOptions,
    OptionViolation, RawGenOptions, Validated, ValidationPolicy,
};

// Orchestration
pub use crate::generator::{
    generate, FailurePolicy, GenerationReport, RunContext, SidecarOutcome,
};

// Tree building
pub use crate::tree::{BuildStep, GenerationStats, RootReset, StepOutcome};

// Topology and labels
pub use crate::sidecar::{chunk_labels, LabelLine};
pub use crate::topology::{encode_topology, TopologySource};

// Error types
pub use crate::error::{Error, Result};
