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

/// This crate is an MSR access layer for reading the core voltage and issuing
/// overclocking mailbox commands via per-core register devices, e.g. `/dev/cpu/<N>/msr`
/// on Linux. For everything else register access reports an unsupported platform.
/// Register access is stateless: every read and write opens and closes the device.

#[cfg(target_os = "linux")]
#[path = "linux/mod.rs"]
mod msr_impl;
#[cfg(not(target_os = "linux"))]
#[path = "other/mod.rs"]
mod msr_impl;

pub mod codec;
mod errors;
pub mod mailbox;
pub mod registers;

use cpu_utils::LogicalCoreId;

pub use codec::extract_bits;
pub use codec::BitField;
pub use codec::CodecError;
pub use errors::MSRError;
pub use msr_impl::*;
pub use registers::RegisterId;

pub type MSRResult<T> = Result<T, MSRError>;

/// Positioned access to the 64-bit registers of one logical core.
pub trait MSRAccess {
    /// Reads the register with the given id on the given core.
    fn read(&self, register_id: RegisterId, core_id: LogicalCoreId) -> MSRResult<u64>;

    /// Writes the whole register with the given id on the given core.
    fn write(&self, register_id: RegisterId, value: u64, core_id: LogicalCoreId) -> MSRResult<()>;
}

impl<T: MSRAccess + ?Sized> MSRAccess for &T {
    fn read(&self, register_id: RegisterId, core_id: LogicalCoreId) -> MSRResult<u64> {
        (**self).read(register_id, core_id)
    }

    fn write(&self, register_id: RegisterId, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        (**self).write(register_id, value, core_id)
    }
}
