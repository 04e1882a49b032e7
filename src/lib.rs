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

//! Fake Intel GPU device trees for testing device discovery without
//! hardware.
//!
//! A run validates [`options::GenerationOptions`], lays out sysfs, devfs
//! and debugfs entries for every device with [`tree`], and publishes the
//! Xe Link topology as node feature discovery labels with [`topology`] and
//! [`sidecar`]. [`generator::generate`] drives the whole sequence.

pub mod cli;
pub mod error;
pub mod generator;
pub mod options;
pub mod prelude;
pub mod sidecar;
pub mod topology;
pub mod tree;
pub mod utils;

pub mod common {
    pub mod config;
}

pub use error::{Error, Result};
