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

//! Node feature discovery sidecar label file.
//!
//! Label values are limited to 63 characters, so a long topology string is
//! spread over `xe-links`, `xe-links2`, `xe-links3`... Continuation values
//! start with `Z` (labels must begin with an alphanumeric) followed by up
//! to 62 topology characters.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::common::config::FakeDriConfig;
use crate::error::{Error, Result};

/// One `key=value` line of the label file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub key: String,
    pub value: String,
}

impl LabelLine {
    /// The topology characters this line carries.
    pub fn payload(&self) -> &str {
        self.value
            .strip_prefix(FakeDriConfig::CONTINUATION_MARK)
            .filter(|_| self.key != FakeDriConfig::XELINK_LABEL_KEY)
            .unwrap_or(&self.value)
    }
}

impl std::fmt::Display for LabelLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Split `topology` into label lines. Empty input gives no lines.
pub fn chunk_labels(topology: &str) -> Vec<LabelLine> {
    let chars: Vec<char> = topology.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let max = FakeDriConfig::MAX_LABEL_LEN;
    let first = max.min(chars.len());
    let mut lines = vec![LabelLine {
        key: FakeDriConfig::XELINK_LABEL_KEY.to_string(),
        value: chars[..first].iter().collect(),
    }];

    for (n, chunk) in chars[first..].chunks(max - 1).enumerate() {
        let mut value = String::with_capacity(max);
        value.push(FakeDriConfig::CONTINUATION_MARK);
        value.extend(chunk);
        lines.push(LabelLine {
            key: format!("{}{}", FakeDriConfig::XELINK_LABEL_KEY, n + 2),
            value,
        });
    }
    lines
}

/// Write `lines` to `path`, truncating it.
///
/// A failure to open the file is [`Error::SidecarCreate`]; a failure after
/// that is [`Error::SidecarWrite`].
pub fn write_sidecar(path: &Path, lines: &[LabelLine]) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::SidecarCreate {
        path: path.to_path_buf(),
        source,
    })?;
    let write_err = |source: std::io::Error| Error::SidecarWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(file);
    for line in lines {
        debug!("{line}");
        writeln!(out, "{line}").map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}
