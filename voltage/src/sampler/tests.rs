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

use std::time::Duration;

use tempfile::NamedTempFile;

use rwvolt_config::PacingPolicy;
use rwvolt_msr::registers::MSR_IA32_PERF_STATUS;
use rwvolt_msr::MSRDevice;
use rwvolt_msr::MSRError;
use rwvolt_test_utils::test_values::any_allowed_core;
use rwvolt_test_utils::test_values::perf_status_with_voltage;
use rwvolt_test_utils::FakeMSRDevices;

use super::*;
use crate::LogicalCoreId;
use crate::VoltageError;

fn sampler_config(core_id: LogicalCoreId, count: usize, pacing: PacingPolicy) -> SamplerConfig {
    SamplerConfig {
        core_id,
        count,
        pacing,
    }
}

fn devices_with_voltage(core_id: LogicalCoreId, raw_voltage: u16) -> FakeMSRDevices {
    let devices = FakeMSRDevices::new([core_id]);
    devices.set_register(
        core_id,
        MSR_IA32_PERF_STATUS,
        perf_status_with_voltage(raw_voltage),
    );
    devices
}

fn timing_line_average(log: &str) -> f64 {
    let line = log
        .lines()
        .find(|line| line.starts_with("Time used per read (ns): "))
        .expect("log should contain a timing line");
    line["Time used per read (ns): ".len()..].parse().unwrap()
}

#[test]
fn voltage_sample_decodes_perf_status() {
    let sample = VoltageSample::from_perf_status(perf_status_with_voltage(0x1C00));

    assert_eq!(sample.raw(), 0x1C00);
    assert_eq!(sample.volts(), 0.875);
    assert_eq!(sample.to_string(), "7168");
}

#[test]
fn sample_buffer_preallocation_is_capped() {
    assert!(sample_buffer(16).capacity() >= 16);

    let huge = sample_buffer(usize::MAX);
    assert!(huge.capacity() >= MAX_PREALLOCATED_SAMPLES);
    assert!(huge.capacity() < usize::MAX);
}

#[test]
fn empty_report_has_zero_average() {
    let report = SamplingReport {
        samples: 0,
        elapsed: Duration::from_micros(3),
    };
    assert_eq!(report.average_ns(), 0.0);

    let report = SamplingReport {
        samples: 4,
        elapsed: Duration::from_micros(2),
    };
    assert_eq!(report.average_ns(), 500.0);
}

#[test_log::test]
fn zero_count_takes_no_samples() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1C00);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let data = NamedTempFile::new().unwrap();
    let log = NamedTempFile::new().unwrap();
    let config = sampler_config(core_id, 0, PacingPolicy::BackToBack);

    let samples = sampler
        .sample_voltage(&config, data.as_file(), log.as_file())
        .unwrap();
    assert_eq!(samples, 0);

    let data = std::fs::read_to_string(data.path()).unwrap();
    assert!(data.is_empty());

    let log = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(timing_line_average(&log), 0.0);
    assert!(log.contains("Data collection complete."));
}

#[test_log::test]
fn back_to_back_writes_one_line_per_sample() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1234);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let data = NamedTempFile::new().unwrap();
    let log = NamedTempFile::new().unwrap();
    let config = sampler_config(core_id, 100, PacingPolicy::BackToBack);

    let samples = sampler
        .sample_voltage(&config, data.as_file(), log.as_file())
        .unwrap();
    assert_eq!(samples, 100);

    let data = std::fs::read_to_string(data.path()).unwrap();
    let lines = data.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 100);
    for line in lines {
        let value: u64 = line.parse().unwrap();
        assert_eq!(value, 0x1234);
        assert!(value < 16384);
    }
}

#[test_log::test]
fn interval_pacing_end_to_end() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1C00);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let data = NamedTempFile::new().unwrap();
    let log = NamedTempFile::new().unwrap();
    let interval = Duration::from_nanos(1_000_000);
    let config = sampler_config(core_id, 5, PacingPolicy::Interval { interval });

    let samples = sampler
        .sample_voltage(&config, data.as_file(), log.as_file())
        .unwrap();
    assert_eq!(samples, 5);

    let data = std::fs::read_to_string(data.path()).unwrap();
    assert_eq!(data, "7168\n".repeat(5));

    let log = std::fs::read_to_string(log.path()).unwrap();
    assert!(log.contains(&format!("Monitoring voltage on core {core_id}.")));
    // the last sample waits for 4 intervals
    let average_ns = timing_line_average(&log);
    assert!(average_ns > 0.0);
    assert!(average_ns >= (4 * interval.as_nanos()) as f64 / 5.0);
    assert!(log.ends_with("Data collection complete.\n"));
}

#[test]
fn run_reports_elapsed_time() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 1);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let interval = Duration::from_micros(200);
    let config = sampler_config(core_id, 11, PacingPolicy::Interval { interval });

    let mut seen = 0;
    let report = sampler
        .run(&config, |_| {
            seen += 1;
            Ok(())
        })
        .unwrap();

    assert_eq!(seen, 11);
    assert_eq!(report.samples, 11);
    assert!(report.elapsed >= interval * 10);
}

#[test]
fn record_keeps_samples_in_memory() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x0F00);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let config = sampler_config(core_id, 8, PacingPolicy::BackToBack);
    let samples = sampler.record(&config).unwrap();

    assert_eq!(samples, vec![VoltageSample::from_perf_status(0x0F00 << 32); 8]);
}

#[test]
fn missing_device_is_fatal() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1C00);
    devices.remove(core_id);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let data = NamedTempFile::new().unwrap();
    let log = NamedTempFile::new().unwrap();
    let config = sampler_config(core_id, 3, PacingPolicy::BackToBack);

    let error = sampler
        .sample_voltage(&config, data.as_file(), log.as_file())
        .unwrap_err();

    assert!(error.is_fatal());
    assert!(matches!(
        error,
        VoltageError::MSRError(MSRError::OpenForRead { .. })
    ));
    let data = std::fs::read_to_string(data.path()).unwrap();
    assert!(data.is_empty());
}

#[test]
fn short_read_is_fatal_and_distinct_from_open_failure() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1C00);
    devices.truncate(core_id, MSR_IA32_PERF_STATUS as u64 + 2);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let config = sampler_config(core_id, 3, PacingPolicy::BackToBack);
    let error = sampler.record(&config).unwrap_err();

    assert!(error.is_fatal());
    match error {
        VoltageError::MSRError(msr_error) => {
            assert!(!msr_error.is_open_error());
            assert!(matches!(msr_error, MSRError::ShortRead { read: 2, .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn read_only_data_sink_is_recoverable() {
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1C00);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let data = NamedTempFile::new().unwrap();
    let read_only_data = std::fs::File::open(data.path()).unwrap();
    let log = NamedTempFile::new().unwrap();
    let config = sampler_config(core_id, 2, PacingPolicy::BackToBack);

    let error = sampler
        .sample_voltage(&config, &read_only_data, log.as_file())
        .unwrap_err();

    assert!(matches!(error, VoltageError::SinkWrite(_)));
    assert!(!error.is_fatal());
}

#[test]
fn sampling_releases_core_binding() {
    let allowed_before = cpu_utils::pinning::allowed_cores();
    let core_id = any_allowed_core();
    let devices = devices_with_voltage(core_id, 0x1C00);
    let sampler = VoltageSampler::new(MSRDevice::new(devices.root()));

    let config = sampler_config(core_id, 1, PacingPolicy::BackToBack);
    sampler.record(&config).unwrap();

    assert_eq!(cpu_utils::pinning::allowed_cores(), allowed_before);
}
