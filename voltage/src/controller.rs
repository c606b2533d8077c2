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

mod schedule;

pub use schedule::ScheduleStep;
pub use schedule::VoltageSchedule;

use std::os::fd::AsFd;

use cpu_utils::LogicalCoreId;
use rwvolt_msr::mailbox::mv_to_mailbox_units;
use rwvolt_msr::mailbox::offset_core_voltage_command;
use rwvolt_msr::mailbox::set_core_voltage_command;
use rwvolt_msr::mailbox::MailboxUnits;
use rwvolt_msr::registers::perf_status_voltage;
use rwvolt_msr::registers::MSR_IA32_PERF_STATUS;
use rwvolt_msr::registers::MSR_OC_MAILBOX;
use rwvolt_msr::MSRAccess;

use crate::sink::DuplicatedSink;
use crate::VoltageResult;

/// Mailbox sub-command used to change the core voltage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoltageMethod {
    /// Shift the voltage relative to the current one.
    Offset,
    /// Request an absolute target voltage.
    Set,
}

impl VoltageMethod {
    pub fn command(&self, units: MailboxUnits) -> u64 {
        match self {
            VoltageMethod::Offset => offset_core_voltage_command(units),
            VoltageMethod::Set => set_core_voltage_command(units),
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            VoltageMethod::Offset => "Voltage offset applied successfully",
            VoltageMethod::Set => "Voltage set successfully",
        }
    }
}

impl std::str::FromStr for VoltageMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offset" => Ok(VoltageMethod::Offset),
            "set" => Ok(VoltageMethod::Set),
            other => Err(format!(
                "unknown voltage method {other:?}, expected offset or set"
            )),
        }
    }
}

/// Issues voltage requests to the overclocking mailbox of a core.
#[derive(Clone, Debug)]
pub struct VoltageController<MSR> {
    msr: MSR,
}

impl<MSR: MSRAccess> VoltageController<MSR> {
    pub fn new(msr: MSR) -> Self {
        Self { msr }
    }

    /// Offsets the core voltage by `offset_mv`, returns the offset in mailbox units.
    pub fn apply_offset(
        &self,
        core_id: LogicalCoreId,
        offset_mv: i32,
        log_sink: impl AsFd,
    ) -> VoltageResult<MailboxUnits> {
        self.apply(VoltageMethod::Offset, core_id, offset_mv, log_sink)
    }

    /// Sets the core voltage to `target_mv`, returns the target in mailbox units.
    pub fn set_target(
        &self,
        core_id: LogicalCoreId,
        target_mv: i32,
        log_sink: impl AsFd,
    ) -> VoltageResult<MailboxUnits> {
        self.apply(VoltageMethod::Set, core_id, target_mv, log_sink)
    }

    /// Converts `millivolts` to mailbox units, writes the mailbox command of `method`
    /// and logs the voltage read right before and after the write.
    pub fn apply(
        &self,
        method: VoltageMethod,
        core_id: LogicalCoreId,
        millivolts: i32,
        log_sink: impl AsFd,
    ) -> VoltageResult<MailboxUnits> {
        let mut log_sink = DuplicatedSink::duplicate(log_sink)?;

        let units = mv_to_mailbox_units(millivolts);
        let command = method.command(units);

        let voltage_before = self.read_voltage(core_id)?;
        tracing::info!(
            "{method:?} core {core_id} voltage with {millivolts} mV ({units} mailbox units), command {command:#X}"
        );
        self.msr.write(MSR_OC_MAILBOX, command, core_id)?;
        let voltage_after = self.read_voltage(core_id)?;

        log_sink.write_line(format_args!(
            "{} on core {core_id}: {units} mailbox units, voltage before {voltage_before}, after {voltage_after}.",
            method.success_message()
        ))?;
        log_sink.close()?;

        Ok(units)
    }

    fn read_voltage(&self, core_id: LogicalCoreId) -> VoltageResult<u64> {
        let perf_status = self.msr.read(MSR_IA32_PERF_STATUS, core_id)?;
        Ok(perf_status_voltage(perf_status))
    }
}
