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

/// Builds a performance status value carrying `raw_voltage` in bits 47:32 and
/// some noise in the neighbouring fields.
pub fn perf_status_with_voltage(raw_voltage: u16) -> u64 {
    0xA5A5_0000_0000_2A00 | ((raw_voltage as u64) << 32)
}

/// Returns the first logical core the test thread is allowed to run on.
pub fn any_allowed_core() -> cpu_utils::LogicalCoreId {
    *cpu_utils::pinning::allowed_cores()
        .first()
        .expect("test process should be allowed to run on at least one core")
}
