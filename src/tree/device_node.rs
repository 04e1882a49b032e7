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

//! Character device nodes for the fake DRI devices.
//!
//! Consumers only check that `cardN`/`renderDN` exist and are character
//! devices, so every node aliases /dev/null (1:3) instead of using real
//! DRM major/minor numbers.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use crate::common::config::FakeDriConfig;

/// Create a (1:3) character device at `path`. Needs CAP_MKNOD.
pub fn make_null_device(path: &Path) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    let ret = unsafe {
        let dev = libc::makedev(FakeDriConfig::DEV_NULL_MAJOR, FakeDriConfig::DEV_NULL_MINOR);
        libc::mknod(
            c_path.as_ptr(),
            libc::S_IFCHR | FakeDriConfig::FILE_MODE as libc::mode_t,
            dev,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Whether `path` is a character device (without following symlinks).
pub fn is_char_device(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_char_device())
        .unwrap_or(false)
}

/// Probe whether this process may create device nodes below `dir`.
pub fn can_create_device_nodes(dir: &Path) -> bool {
    let probe = dir.join(".fake-dri-mknod-probe");
    let ok = make_null_device(&probe).is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}
