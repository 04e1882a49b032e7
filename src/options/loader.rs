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

use std::fs;
use std::path::Path;

use tracing::debug;

use super::RawGenOptions;
use crate::error::{Error, Result};

fn read_spec(path: &Path) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptySpec);
    }
    fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON spec file.
pub fn load_json_file(path: &Path) -> Result<RawGenOptions> {
    let data = read_spec(path)?;
    parse_json(&data)
}

/// Read a YAML spec file.
pub fn load_yaml_file(path: &Path) -> Result<RawGenOptions> {
    let data = read_spec(path)?;
    parse_yaml(&data)
}

pub fn parse_json(data: &str) -> Result<RawGenOptions> {
    if data.trim().is_empty() {
        return Err(Error::EmptySpec);
    }
    debug!("Using fake device JSON spec: {data}");
    Ok(serde_json::from_str(data)?)
}

pub fn parse_yaml(spec: &str) -> Result<RawGenOptions> {
    if spec.trim().is_empty() {
        return Err(Error::EmptySpec);
    }
    debug!("Using fake device YAML spec: {spec}");
    Ok(serde_yaml::from_str(spec)?)
}
