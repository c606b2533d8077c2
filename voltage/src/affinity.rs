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

use cpu_utils::pinning::PinningGuard;
use cpu_utils::LogicalCoreId;

use crate::errors::VoltageError;
use crate::VoltageResult;

/// Keeps the current thread on one logical core until dropped.
pub type CoreBinding = PinningGuard;

/// Restricts the calling thread to `core_id`, register values are per core and the
/// timing of a sampling run is only meaningful without core migrations.
pub fn bind_current_execution_to_core(core_id: LogicalCoreId) -> VoltageResult<CoreBinding> {
    PinningGuard::pin(core_id).map_err(|error| {
        tracing::error!("binding to logical core {core_id} failed: {error}");
        VoltageError::pinning_failed(core_id, error)
    })
}
