/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fs::File;
use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use cpu_utils::LogicalCoreId;

/// Size of every fake register device, covers all registers the crates touch.
pub const FAKE_REGISTER_SPACE_SIZE: u64 = 0x1000;

/// A `<root>/<core_id>/msr` tree of regular files standing in for the per-core
/// register devices, a register value lives at the byte offset equal to its id.
#[derive(Debug)]
pub struct FakeMSRDevices {
    root: TempDir,
}

impl FakeMSRDevices {
    pub fn new(core_ids: impl IntoIterator<Item = LogicalCoreId>) -> Self {
        let root = tempfile::tempdir().expect("temp dir for fake MSR devices should be created");
        let devices = Self { root };

        for core_id in core_ids {
            let core_dir = devices.root().join(core_id.to_string());
            std::fs::create_dir_all(&core_dir).expect("fake core dir should be created");

            let file = File::create(core_dir.join("msr")).expect("fake MSR file should be created");
            file.set_len(FAKE_REGISTER_SPACE_SIZE)
                .expect("fake MSR file should be resized");
        }

        devices
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn device_path(&self, core_id: LogicalCoreId) -> PathBuf {
        self.root().join(core_id.to_string()).join("msr")
    }

    pub fn set_register(&self, core_id: LogicalCoreId, register_id: u32, value: u64) {
        let file = OpenOptions::new()
            .write(true)
            .open(self.device_path(core_id))
            .expect("fake MSR file should be opened for write");
        file.write_all_at(&value.to_le_bytes(), register_id as u64)
            .expect("fake MSR register should be written");
    }

    pub fn register(&self, core_id: LogicalCoreId, register_id: u32) -> u64 {
        let file = File::open(self.device_path(core_id)).expect("fake MSR file should be opened");
        let mut value = [0u8; 8];
        file.read_exact_at(&mut value, register_id as u64)
            .expect("fake MSR register should be read");

        u64::from_le_bytes(value)
    }

    /// Cuts the device file to `len` bytes, reads crossing the end come back short.
    pub fn truncate(&self, core_id: LogicalCoreId, len: u64) {
        let file = OpenOptions::new()
            .write(true)
            .open(self.device_path(core_id))
            .expect("fake MSR file should be opened for write");
        file.set_len(len).expect("fake MSR file should be truncated");
    }

    /// Removes the device of the core, opening it fails afterwards.
    pub fn remove(&self, core_id: LogicalCoreId) {
        std::fs::remove_file(self.device_path(core_id)).expect("fake MSR file should be removed");
    }
}
