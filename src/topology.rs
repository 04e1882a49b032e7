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

//! Xe Link topology encoding.
//!
//! Endpoints are `"{device}.{tile}"` and a link is `"{to}-{from}"`. Links
//! are joined with `_` into the string published by the sidecar labels.

use std::collections::HashSet;
use std::fmt;

use crate::common::config::FakeDriConfig;
use crate::options::GenerationOptions;

/// Where the topology string comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologySource<'a> {
    /// Every tile linked to every other tile.
    FullMesh { devices: usize, tiles: usize },
    /// The `connections` capability, used verbatim.
    Explicit(&'a str),
}

impl fmt::Display for TopologySource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologySource::FullMesh { .. } => f.write_str(FakeDriConfig::FULLY_CONNECTED),
            TopologySource::Explicit(_) => f.write_str("explicit"),
        }
    }
}

impl TopologySource<'_> {
    /// Pick the topology requested by the capabilities, if any.
    pub fn select(opts: &GenerationOptions) -> Option<TopologySource<'_>> {
        if opts.wants_full_mesh() {
            return Some(TopologySource::FullMesh {
                devices: opts.device_count,
                tiles: opts.tiles_per_device.get(),
            });
        }
        match opts.capability(FakeDriConfig::CAP_CONNECTIONS) {
            Some(connections) if !connections.is_empty() => {
                Some(TopologySource::Explicit(connections))
            }
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            TopologySource::FullMesh { devices, tiles } => full_mesh(*devices, *tiles),
            TopologySource::Explicit(connections) => (*connections).to_string(),
        }
    }
}

/// Endpoints in row-major `(device, tile)` order.
pub fn endpoints(devices: usize, tiles: usize) -> Vec<String> {
    (0..devices)
        .flat_map(|device| (0..tiles).map(move |tile| format!("{device}.{tile}")))
        .collect()
}

/// One link per unordered endpoint pair, destination first.
pub fn full_mesh_links(devices: usize, tiles: usize) -> Vec<String> {
    let nodes = endpoints(devices, tiles);
    let mut seen = HashSet::new();
    let mut links = Vec::with_capacity(nodes.len() * nodes.len().saturating_sub(1) / 2);

    for from in &nodes {
        for to in &nodes {
            if to == from {
                continue;
            }
            let reverse = format!("{from}-{to}");
            if seen.contains(&reverse) {
                continue;
            }
            let link = format!("{to}-{from}");
            seen.insert(link.clone());
            links.push(link);
        }
    }
    links
}

pub fn full_mesh(devices: usize, tiles: usize) -> String {
    full_mesh_links(devices, tiles).join("_")
}

/// The topology string for `opts`, or `None` when no sidecar is wanted.
pub fn encode_topology(opts: &GenerationOptions) -> Option<String> {
    TopologySource::select(opts)
        .map(|source| source.encode())
        .filter(|topology| !topology.is_empty())
}
