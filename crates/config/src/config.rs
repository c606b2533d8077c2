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

use std::path::PathBuf;
use std::time::Duration;

use cpu_utils::LogicalCoreId;

use crate::defaults::default_count;
use crate::defaults::default_core_id;
use crate::defaults::default_interval_ns;
use crate::defaults::default_log_level;
use crate::defaults::default_msr_root;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RwVoltConfig {
    pub sampler: Sampler,
    pub msr: Msr,
    pub logs: Logs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sampler {
    pub core_id: LogicalCoreId,
    pub count: usize,
    pub pacing: PacingPolicy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PacingPolicy {
    /// Sample `i` is taken once `i * interval` elapsed since the run started.
    Interval { interval: Duration },
    /// Samples are taken back-to-back as fast as register access permits.
    BackToBack,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Msr {
    /// Directory holding the `<core_id>/msr` register devices.
    pub root: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Logs {
    pub log_level: tracing_subscriber::filter::LevelFilter,
}

impl PacingPolicy {
    /// Interval pacing for a non-zero interval, back-to-back otherwise.
    pub fn from_interval_ns(interval_ns: u64) -> Self {
        if interval_ns == 0 {
            return Self::BackToBack;
        }

        Self::Interval {
            interval: Duration::from_nanos(interval_ns),
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            core_id: default_core_id(),
            count: default_count(),
            pacing: PacingPolicy::from_interval_ns(default_interval_ns()),
        }
    }
}

impl Default for Msr {
    fn default() -> Self {
        Self {
            root: default_msr_root(),
        }
    }
}

impl Default for Logs {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_tracing_filter(),
        }
    }
}
