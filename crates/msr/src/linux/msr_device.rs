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
use std::io;
use std::path::Path;
use std::path::PathBuf;

use cpu_utils::LogicalCoreId;

use crate::errors::MSRError;
use crate::MSRAccess;
use crate::MSRResult;
use crate::RegisterId;

pub const DEFAULT_MSR_ROOT: &str = "/dev/cpu";

const REGISTER_SIZE: usize = std::mem::size_of::<u64>();

enum MSRFileOpMode {
    MSRRead,
    MSRWrite,
}

/// Per-core register devices laid out as `<root>/<core_id>/msr`.
///
/// It keeps only the root path, each access opens the device, does one positioned
/// read or write and closes it again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MSRDevice {
    root: PathBuf,
}

impl MSRDevice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn device_path(&self, core_id: LogicalCoreId) -> PathBuf {
        self.root.join(core_id.to_string()).join("msr")
    }

    pub fn read_msr(&self, register_id: RegisterId, core_id: LogicalCoreId) -> MSRResult<u64> {
        use nix::sys::uio::pread;

        let path = self.device_path(core_id);
        let file = open_msr(&path, MSRFileOpMode::MSRRead)
            .map_err(|error| MSRError::open_for_read(core_id, path, error))?;

        let mut value = [0u8; REGISTER_SIZE];
        let read = pread(&file, &mut value, register_id as i64)
            .map_err(|errno| MSRError::read_w_no_err(register_id, core_id, errno))?;
        if read != REGISTER_SIZE {
            return Err(MSRError::short_read(register_id, core_id, read));
        }
        let result = u64::from_le_bytes(value);

        tracing::debug!("Read MSR register_id {register_id:#X} value {result:#X} at core id {core_id}");

        Ok(result)
    }

    pub fn write_msr(
        &self,
        register_id: RegisterId,
        value: u64,
        core_id: LogicalCoreId,
    ) -> MSRResult<()> {
        use nix::sys::uio::pwrite;

        let path = self.device_path(core_id);
        let file = open_msr(&path, MSRFileOpMode::MSRWrite)
            .map_err(|error| MSRError::open_for_write(core_id, path, error))?;

        let value_as_bytes = value.to_le_bytes();
        let written = pwrite(&file, &value_as_bytes, register_id as i64)
            .map_err(|errno| MSRError::write_w_no_err(value, register_id, core_id, errno))?;
        if written != REGISTER_SIZE {
            return Err(MSRError::short_write(value, register_id, core_id, written));
        }

        tracing::debug!(
            "Write MSR register_id {register_id:#X} value {value:#X} at core id {core_id}"
        );

        Ok(())
    }
}

impl Default for MSRDevice {
    fn default() -> Self {
        Self::new(DEFAULT_MSR_ROOT)
    }
}

impl MSRAccess for MSRDevice {
    fn read(&self, register_id: RegisterId, core_id: LogicalCoreId) -> MSRResult<u64> {
        self.read_msr(register_id, core_id)
    }

    fn write(&self, register_id: RegisterId, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        self.write_msr(register_id, value, core_id)
    }
}

/// Reads a register through `/dev/cpu/<core_id>/msr`.
pub fn read_msr(register_id: RegisterId, core_id: LogicalCoreId) -> MSRResult<u64> {
    MSRDevice::default().read_msr(register_id, core_id)
}

/// Writes a register through `/dev/cpu/<core_id>/msr`.
pub fn write_msr(register_id: RegisterId, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
    MSRDevice::default().write_msr(register_id, value, core_id)
}

fn open_msr(path: &Path, mode: MSRFileOpMode) -> io::Result<File> {
    use std::fs::OpenOptions;

    match mode {
        MSRFileOpMode::MSRRead => OpenOptions::new().read(true).open(path),
        MSRFileOpMode::MSRWrite => OpenOptions::new().write(true).open(path),
    }
}
