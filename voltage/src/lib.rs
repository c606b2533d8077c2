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

#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![deny(
    dead_code,
    nonstandard_style,
    unused_imports,
    unused_mut,
    unused_variables,
    unused_unsafe,
    unreachable_patterns
)]

mod affinity;
mod controller;
mod errors;
mod sampler;
mod sink;

pub use affinity::bind_current_execution_to_core;
pub use affinity::CoreBinding;
pub use controller::ScheduleStep;
pub use controller::VoltageController;
pub use controller::VoltageMethod;
pub use controller::VoltageSchedule;
pub use errors::VoltageError;
pub use sampler::SamplingReport;
pub use sampler::VoltageSample;
pub use sampler::VoltageSampler;

pub use cpu_utils::LogicalCoreId;
pub use rwvolt_config::PacingPolicy;
pub use rwvolt_config::Sampler as SamplerConfig;
pub use rwvolt_msr::mailbox::MailboxUnits;

pub type VoltageResult<T> = Result<T, VoltageError>;
