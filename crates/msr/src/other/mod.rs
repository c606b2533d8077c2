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

//! This module is no-op implementation to allow the code to compile on platforms
//! without per-core register devices.

use std::path::Path;
use std::path::PathBuf;

use cpu_utils::LogicalCoreId;

use crate::errors::MSRError;
use crate::MSRAccess;
use crate::MSRResult;
use crate::RegisterId;

pub const DEFAULT_MSR_ROOT: &str = "/dev/cpu";

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

    pub fn read_msr(&self, _register_id: RegisterId, _core_id: LogicalCoreId) -> MSRResult<u64> {
        Err(MSRError::Unsupported)
    }

    pub fn write_msr(
        &self,
        _register_id: RegisterId,
        _value: u64,
        _core_id: LogicalCoreId,
    ) -> MSRResult<()> {
        Err(MSRError::Unsupported)
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

pub fn read_msr(register_id: RegisterId, core_id: LogicalCoreId) -> MSRResult<u64> {
    MSRDevice::default().read_msr(register_id, core_id)
}

pub fn write_msr(register_id: RegisterId, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
    MSRDevice::default().write_msr(register_id, value, core_id)
}
