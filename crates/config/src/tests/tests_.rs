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

use tracing_subscriber::filter::LevelFilter;

use crate::config_loader::environment_source;
use crate::config_loader::load_config;
use crate::config_loader::load_config_with_environment;
use crate::Logs;
use crate::Msr;
use crate::PacingPolicy;
use crate::RwVoltConfig;
use crate::Sampler;
use crate::UnresolvedRwVoltConfig;

fn test_config_path(name: &str) -> String {
    let mut manifest_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_path.push("src/tests");
    manifest_path.push(name);
    manifest_path.to_str().unwrap().to_string()
}

#[test]
fn parse_basic_config() {
    let actual_config = load_config(&test_config_path("default.toml")).unwrap();

    let sampler = Sampler {
        core_id: 2.into(),
        count: 5000,
        pacing: PacingPolicy::Interval {
            interval: Duration::from_millis(1),
        },
    };
    let msr = Msr {
        root: "/tmp/rwvolt/cpu".into(),
    };
    let logs = Logs {
        log_level: LevelFilter::DEBUG,
    };
    let expected_config = RwVoltConfig { sampler, msr, logs };

    assert_eq!(actual_config, expected_config);
}

#[test]
fn explicit_pacing_overrides_interval() {
    let actual_config = load_config(&test_config_path("back_to_back.toml")).unwrap();

    let sampler = Sampler {
        core_id: 3.into(),
        count: 1000,
        pacing: PacingPolicy::BackToBack,
    };

    assert_eq!(actual_config.sampler, sampler);
    assert_eq!(actual_config.msr, Msr::default());
    assert_eq!(actual_config.logs.log_level, LevelFilter::INFO);
}

#[test]
fn interval_pacing_requires_interval() {
    let result = load_config(&test_config_path("invalid_pacing.toml"));
    assert!(result.is_err());
}

#[test]
fn missing_config_is_an_error() {
    let result = load_config(&test_config_path("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn defaults_resolve_to_default_config() {
    let actual_config = UnresolvedRwVoltConfig::default().resolve().unwrap();

    assert_eq!(actual_config, RwVoltConfig::default());
    assert_eq!(actual_config.sampler.pacing, PacingPolicy::BackToBack);
    assert_eq!(actual_config.msr.root, PathBuf::from("/dev/cpu"));
}

#[test]
fn environment_overrides_multi_word_keys() {
    let variables = [
        ("RWVOLT_SAMPLER__COUNT", "7"),
        ("RWVOLT_SAMPLER__INTERVAL_NS", "5000"),
        ("RWVOLT_SAMPLER__CORE_ID", "9"),
        ("RWVOLT_LOGS__LOG_LEVEL", "trace"),
        ("UNRELATED_SAMPLER__COUNT", "1"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect::<config::Map<String, String>>();
    let environment = environment_source().source(Some(variables));

    let actual_config =
        load_config_with_environment(&test_config_path("default.toml"), environment).unwrap();

    let sampler = Sampler {
        core_id: 9.into(),
        count: 7,
        pacing: PacingPolicy::Interval {
            interval: Duration::from_nanos(5000),
        },
    };
    assert_eq!(actual_config.sampler, sampler);
    assert_eq!(actual_config.logs.log_level, LevelFilter::TRACE);
    assert_eq!(actual_config.msr.root, PathBuf::from("/tmp/rwvolt/cpu"));
}
