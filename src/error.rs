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

//! Unified error types for the fake-dri library.
//!
//! Filesystem variants always carry the path that was being created so a
//! failed step can be reported without extra context.
//!
//! # Example
//!
//! ```rust,no_run
//! use fake_dri::{options, Result};
//!
//! fn load() -> Result<()> {
//!     let raw = options::load_json_file("fake-gpus.json".as_ref())?;
//!     let validated = options::validate(raw);
//!     println!("{} violation(s)", validated.violations.len());
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::options::OptionViolation;

/// The main error type for fake-dri operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A directory in the generated tree could not be created.
    #[error("Directory creation failed for '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A regular attribute file could not be created or written.
    #[error("File write failed for '{}': {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A symlink could not be created.
    #[error("Symlink creation failed '{}' -> '{target}': {source}", .link.display())]
    Symlink {
        link: PathBuf,
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// A character device node could not be created.
    ///
    /// Creating device nodes needs CAP_MKNOD, so this is the usual failure
    /// when running unprivileged.
    #[error("NULL device ({major}:{minor}) node creation failed for '{}': {source}", .path.display())]
    DeviceNode {
        path: PathBuf,
        major: u32,
        minor: u32,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be read.
    #[error("Reading spec file '{}' failed: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unmarshaling JSON spec failed: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Unmarshaling YAML spec failed: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    /// No configuration content was supplied at all.
    #[error("No fake device spec provided")]
    EmptySpec,

    /// Validation found violations and the strict policy was requested.
    #[error("Invalid fake device spec: {}", format_violations(.0))]
    InvalidOptions(Vec<OptionViolation>),

    #[error("Failed to create sidecar label file '{}': {source}", .path.display())]
    SidecarCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an already opened sidecar file failed. There is no
    /// fallback destination, so callers treat this as fatal.
    #[error("Failed to write sidecar label file '{}': {source}", .path.display())]
    SidecarWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_violations(violations: &[OptionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Whether the failure came from missing privileges rather than a bad
    /// path or a collision.
    pub fn is_permission_denied(&self) -> bool {
        let source = match self {
            Error::CreateDir { source, .. }
            | Error::WriteFile { source, .. }
            | Error::Symlink { source, .. }
            | Error::DeviceNode { source, .. }
            | Error::ReadConfig { source, .. }
            | Error::SidecarCreate { source, .. }
            | Error::SidecarWrite { source, .. } => source,
            _ => return false,
        };
        source.kind() == std::io::ErrorKind::PermissionDenied
            || source.raw_os_error() == Some(libc::EPERM)
    }
}

/// A specialized Result type for fake-dri operations.
pub type Result<T> = std::result::Result<T, Error>;
