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

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use eyre::WrapErr as _;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use rwvolt::LogicalCoreId;
use rwvolt::PacingPolicy;
use rwvolt::SamplerConfig;
use rwvolt::VoltageController;
use rwvolt::VoltageError;
use rwvolt::VoltageMethod;
use rwvolt::VoltageSampler;
use rwvolt::VoltageSchedule;
use rwvolt_config::load_config;
use rwvolt_config::RwVoltConfig;
use rwvolt_msr::MSRDevice;

const FATAL_EXIT_CODE: u8 = 1;
const SINK_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[command(version, about = "Sample and adjust per-core CPU voltage through MSR")]
struct Args {
    #[arg(short, long = "config", value_name = "PATH")]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the core voltage, one raw value per line.
    Read {
        #[arg(short, long)]
        core: Option<LogicalCoreId>,

        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Pace samples by this interval, 0 samples back-to-back.
        #[arg(short, long)]
        interval_ns: Option<u64>,

        /// Write samples into this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Offset the core voltage by the given millivolts.
    Offset {
        #[arg(short, long)]
        core: LogicalCoreId,

        #[arg(short, long, allow_hyphen_values = true)]
        mv: i32,
    },

    /// Set the core voltage to the given millivolts.
    Set {
        #[arg(short, long)]
        core: LogicalCoreId,

        #[arg(short, long, allow_hyphen_values = true)]
        mv: i32,
    },

    /// Apply a sequence of voltage values, each after its period elapsed.
    Schedule {
        #[arg(short, long, num_args = 1.., required = true)]
        cores: Vec<LogicalCoreId>,

        #[arg(short, long, default_value = "offset")]
        method: VoltageMethod,

        #[arg(short, long, num_args = 1.., required = true)]
        periods_ms: Vec<u64>,

        #[arg(short, long, num_args = 1.., required = true, allow_hyphen_values = true)]
        values: Vec<i32>,
    },
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("Error: {report:?}");
            ExitCode::from(exit_code(&report))
        }
    }
}

fn run(args: Args) -> eyre::Result<()> {
    let config = match &args.config_path {
        Some(config_path) => load_config(config_path)?,
        None => RwVoltConfig::default(),
    };

    init_tracing(&config)?;

    let device = MSRDevice::new(config.msr.root.clone());
    match args.command {
        Command::Read {
            core,
            count,
            interval_ns,
            output,
        } => {
            let sampler_config = override_sampler(&config.sampler, core, count, interval_ns);
            let sampler = VoltageSampler::new(device);
            let samples = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .wrap_err_with(|| format!("creating output file {path:?} failed"))?;
                    sampler.sample_voltage(&sampler_config, &file, std::io::stderr())?
                }
                None => {
                    sampler.sample_voltage(&sampler_config, std::io::stdout(), std::io::stderr())?
                }
            };
            tracing::info!("{samples} samples taken on core {}", sampler_config.core_id);
        }
        Command::Offset { core, mv } => {
            let controller = VoltageController::new(device);
            let units = controller.apply_offset(core, mv, std::io::stderr())?;
            tracing::info!("core {core} voltage offset by {units} mailbox units");
        }
        Command::Set { core, mv } => {
            let controller = VoltageController::new(device);
            let units = controller.set_target(core, mv, std::io::stderr())?;
            tracing::info!("core {core} voltage set to {units} mailbox units");
        }
        Command::Schedule {
            cores,
            method,
            periods_ms,
            values,
        } => {
            let schedule = VoltageSchedule::from_periods_ms(&periods_ms, &values)?;
            let controller = VoltageController::new(device);
            let applied = schedule.run(&controller, method, &cores, std::io::stderr())?;
            tracing::info!("voltage schedule applied to cores {cores:?}: {applied:?}");
        }
    }

    Ok(())
}

fn override_sampler(
    configured: &SamplerConfig,
    core: Option<LogicalCoreId>,
    count: Option<usize>,
    interval_ns: Option<u64>,
) -> SamplerConfig {
    let mut sampler_config = configured.clone();
    if let Some(core) = core {
        sampler_config.core_id = core;
    }
    if let Some(count) = count {
        sampler_config.count = count;
    }
    if let Some(interval_ns) = interval_ns {
        sampler_config.pacing = PacingPolicy::from_interval_ns(interval_ns);
    }

    sampler_config
}

fn init_tracing(config: &RwVoltConfig) -> eyre::Result<()> {
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .with_default_directive(Directive::from(config.logs.log_level))
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("setting global tracing subscriber failed")?;
    tracing_log::LogTracer::init()?;

    Ok(())
}

// Only sink failures are recoverable, register, pinning and config failures are fatal.
fn exit_code(report: &eyre::Report) -> u8 {
    match report.downcast_ref::<VoltageError>() {
        Some(error) if !error.is_fatal() => SINK_EXIT_CODE,
        _ => FATAL_EXIT_CODE,
    }
}
