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

use nix::errno::Errno;
use thiserror::Error as ThisError;

use crate::LogicalCoreId;

#[derive(Debug, ThisError)]
pub enum CPUPinningError {
    #[error("logical core id {core_id} doesn't fit into a cpu set of {max_cores} cores")]
    LogicalCoreIdTooBig {
        core_id: LogicalCoreId,
        max_cores: usize,
    },

    #[error("reading the affinity mask of the current thread failed: {errno:?}")]
    GetAffinityFailed { errno: Errno },

    #[error("pinning the current thread to logical core {core_id} failed: {errno:?}")]
    PinFailed { core_id: LogicalCoreId, errno: Errno },

    #[error("pinning the current thread to logical core {core_id} was rejected")]
    PinRejected { core_id: LogicalCoreId },

    #[error("restoring the affinity mask of the current thread failed: {errno:?}")]
    RestoreFailed { errno: Errno },
}

impl CPUPinningError {
    pub fn logical_core_too_big(core_id: LogicalCoreId, max_cores: usize) -> Self {
        Self::LogicalCoreIdTooBig { core_id, max_cores }
    }

    pub fn get_affinity_failed(errno: Errno) -> Self {
        Self::GetAffinityFailed { errno }
    }

    pub fn pin_failed(core_id: LogicalCoreId, errno: Errno) -> Self {
        Self::PinFailed { core_id, errno }
    }

    pub fn pin_rejected(core_id: LogicalCoreId) -> Self {
        Self::PinRejected { core_id }
    }

    pub fn restore_failed(errno: Errno) -> Self {
        Self::RestoreFailed { errno }
    }
}
