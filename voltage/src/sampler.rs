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

#[cfg(test)]
mod tests;

use std::fmt;
use std::os::fd::AsFd;
use std::time::Duration;
use std::time::Instant;

use rwvolt_config::PacingPolicy;
use rwvolt_msr::registers::perf_status_voltage;
use rwvolt_msr::registers::raw_voltage_to_volts;
use rwvolt_msr::registers::MSR_IA32_PERF_STATUS;
use rwvolt_msr::MSRAccess;

use crate::affinity::bind_current_execution_to_core;
use crate::sink::DuplicatedSink;
use crate::SamplerConfig;
use crate::VoltageResult;

/// Core voltage in raw status register units, volts are `raw / 8192`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoltageSample(u16);

impl VoltageSample {
    pub fn from_perf_status(perf_status: u64) -> Self {
        // the voltage field is 16 bits wide
        Self(perf_status_voltage(perf_status) as u16)
    }

    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn volts(&self) -> f64 {
        raw_voltage_to_volts(self.0 as u64)
    }
}

impl fmt::Display for VoltageSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingReport {
    pub samples: usize,
    pub elapsed: Duration,
}

impl SamplingReport {
    /// Average time per sample, zero for an empty run.
    pub fn average_ns(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }

        self.elapsed.as_nanos() as f64 / self.samples as f64
    }
}

/// Samples the voltage of one core by reading its performance status register in a
/// fixed-count loop.
#[derive(Clone, Debug)]
pub struct VoltageSampler<MSR> {
    msr: MSR,
}

impl<MSR: MSRAccess> VoltageSampler<MSR> {
    pub fn new(msr: MSR) -> Self {
        Self { msr }
    }

    /// Writes `config.count` samples into `data_sink` one per line and the run
    /// diagnostics into `log_sink`. Both sinks are duplicated, the caller handles stay
    /// open. Returns the number of samples taken.
    pub fn sample_voltage(
        &self,
        config: &SamplerConfig,
        data_sink: impl AsFd,
        log_sink: impl AsFd,
    ) -> VoltageResult<usize> {
        let mut data_sink = DuplicatedSink::duplicate(data_sink)?;
        let mut log_sink = DuplicatedSink::duplicate(log_sink)?;
        let _binding = bind_current_execution_to_core(config.core_id)?;

        log_sink.write_line(format_args!(
            "Monitoring voltage on core {}.",
            config.core_id
        ))?;

        let report = self.sample_loop(config, |sample| data_sink.write_line(sample))?;

        log_sink.write_line(format_args!(
            "Time used per read (ns): {:.6}",
            report.average_ns()
        ))?;
        log_sink.write_line("Data collection complete.")?;

        data_sink.close()?;
        log_sink.close()?;

        Ok(report.samples)
    }

    /// Same loop as [`Self::sample_voltage`], keeps samples in memory.
    pub fn record(&self, config: &SamplerConfig) -> VoltageResult<Vec<VoltageSample>> {
        let mut samples = sample_buffer(config.count);
        self.run(config, |sample| {
            samples.push(sample);
            Ok(())
        })?;

        Ok(samples)
    }

    /// Binds to the core, then reads `config.count` samples paced by `config.pacing`
    /// and hands each one to `on_sample`.
    pub fn run(
        &self,
        config: &SamplerConfig,
        on_sample: impl FnMut(VoltageSample) -> VoltageResult<()>,
    ) -> VoltageResult<SamplingReport> {
        let _binding = bind_current_execution_to_core(config.core_id)?;
        self.sample_loop(config, on_sample)
    }

    // The caller keeps the thread bound to `config.core_id` for the whole loop.
    fn sample_loop(
        &self,
        config: &SamplerConfig,
        mut on_sample: impl FnMut(VoltageSample) -> VoltageResult<()>,
    ) -> VoltageResult<SamplingReport> {
        let core_id = config.core_id;
        tracing::info!(
            "sampling {} voltage values on core {core_id} with {:?} pacing",
            config.count,
            config.pacing
        );

        let started = Instant::now();
        for sample_id in 0..config.count {
            if let PacingPolicy::Interval { interval } = config.pacing {
                wait_for_tick(started, interval, sample_id);
            }

            let perf_status = self.msr.read(MSR_IA32_PERF_STATUS, core_id)?;
            on_sample(VoltageSample::from_perf_status(perf_status))?;
        }
        let elapsed = started.elapsed();

        let report = SamplingReport {
            samples: config.count,
            elapsed,
        };
        tracing::info!(
            "sampled {} voltage values on core {core_id} in {elapsed:?}, {:.1} ns per read",
            report.samples,
            report.average_ns()
        );

        Ok(report)
    }
}

// Bigger runs grow the buffer on demand.
const MAX_PREALLOCATED_SAMPLES: usize = 1 << 20;

fn sample_buffer(count: usize) -> Vec<VoltageSample> {
    Vec::with_capacity(count.min(MAX_PREALLOCATED_SAMPLES))
}

/// Busy-waits until `sample_id * interval` elapsed since `started`.
fn wait_for_tick(started: Instant, interval: Duration, sample_id: usize) {
    let tick_ns = interval.as_nanos() * sample_id as u128;
    while started.elapsed().as_nanos() < tick_ns {
        std::hint::spin_loop();
    }
}
