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

use eyre::eyre;
use serde::Deserialize;
use serde::Serialize;

use cpu_utils::LogicalCoreId;

use super::defaults::default_core_id;
use super::defaults::default_count;
use super::defaults::default_interval_ns;
use super::defaults::default_log_level;
use super::defaults::default_msr_root;
use crate::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedRwVoltConfig {
    #[serde(default)]
    pub sampler: UnresolvedSampler,
    #[serde(default)]
    pub msr: UnresolvedMsr,
    #[serde(default)]
    pub logs: UnresolvedLogs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedSampler {
    #[serde(default = "default_core_id")]
    pub core_id: LogicalCoreId,

    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default = "default_interval_ns")]
    pub interval_ns: u64,

    pub pacing: Option<Pacing>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pacing {
    Interval,
    BackToBack,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedMsr {
    #[serde(default = "default_msr_root")]
    pub root: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedLogs {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for UnresolvedSampler {
    fn default() -> Self {
        Self {
            core_id: default_core_id(),
            count: default_count(),
            interval_ns: default_interval_ns(),
            pacing: None,
        }
    }
}

impl Default for UnresolvedMsr {
    fn default() -> Self {
        Self {
            root: default_msr_root(),
        }
    }
}

impl Default for UnresolvedLogs {
    fn default() -> Self {
        UnresolvedLogs {
            log_level: default_log_level(),
        }
    }
}

impl UnresolvedRwVoltConfig {
    pub fn resolve(self) -> eyre::Result<RwVoltConfig> {
        let config = RwVoltConfig {
            sampler: self.sampler.resolve()?,
            msr: self.msr.resolve(),
            logs: self.logs.resolve(),
        };
        Ok(config)
    }
}

impl UnresolvedSampler {
    pub fn resolve(self) -> eyre::Result<Sampler> {
        let pacing = match self.pacing {
            None => PacingPolicy::from_interval_ns(self.interval_ns),
            Some(Pacing::BackToBack) => PacingPolicy::BackToBack,
            Some(Pacing::Interval) if self.interval_ns == 0 => {
                return Err(eyre!(
                    "sampler pacing is set to interval, but interval-ns is 0"
                ))
            }
            Some(Pacing::Interval) => PacingPolicy::Interval {
                interval: Duration::from_nanos(self.interval_ns),
            },
        };

        Ok(Sampler {
            core_id: self.core_id,
            count: self.count,
            pacing,
        })
    }
}

impl UnresolvedMsr {
    pub fn resolve(self) -> Msr {
        Msr { root: self.root }
    }
}

impl LogLevel {
    pub fn to_tracing_filter(&self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;

        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl UnresolvedLogs {
    pub fn resolve(self) -> Logs {
        Logs {
            log_level: self.log_level.to_tracing_filter(),
        }
    }
}
