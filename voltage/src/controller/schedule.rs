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

use std::os::fd::AsFd;
use std::time::Duration;
use std::time::Instant;

use cpu_utils::LogicalCoreId;
use rwvolt_msr::mailbox::mv_to_mailbox_units;
use rwvolt_msr::mailbox::MailboxUnits;
use rwvolt_msr::MSRAccess;

use super::VoltageController;
use super::VoltageMethod;
use crate::errors::VoltageError;
use crate::VoltageResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleStep {
    /// Time to wait after the previous step before applying this one.
    pub period: Duration,
    pub millivolts: i32,
}

/// A sequence of voltage changes applied one after another.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoltageSchedule {
    steps: Vec<ScheduleStep>,
}

impl VoltageSchedule {
    pub fn new(steps: Vec<ScheduleStep>) -> Self {
        Self { steps }
    }

    /// Pairs periods in milliseconds with millivolt values, both lists must have the
    /// same length.
    pub fn from_periods_ms(periods_ms: &[u64], values_mv: &[i32]) -> VoltageResult<Self> {
        if periods_ms.len() != values_mv.len() {
            return Err(VoltageError::schedule_mismatch(
                periods_ms.len(),
                values_mv.len(),
            ));
        }

        let steps = periods_ms
            .iter()
            .zip(values_mv)
            .map(|(&period_ms, &millivolts)| ScheduleStep {
                period: Duration::from_millis(period_ms),
                millivolts,
            })
            .collect();

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ScheduleStep] {
        &self.steps
    }

    /// Applies every step to all `core_ids`. A step starts once its period elapsed
    /// since the previous step was applied. Returns the mailbox units of each step.
    pub fn run<MSR: MSRAccess>(
        &self,
        controller: &VoltageController<MSR>,
        method: VoltageMethod,
        core_ids: &[LogicalCoreId],
        log_sink: impl AsFd,
    ) -> VoltageResult<Vec<MailboxUnits>> {
        let log_sink = log_sink.as_fd();
        let mut applied = Vec::with_capacity(self.steps.len());

        let mut step_started = Instant::now();
        for step in &self.steps {
            let waited = step_started.elapsed();
            if waited < step.period {
                std::thread::sleep(step.period - waited);
            }

            for &core_id in core_ids {
                controller.apply(method, core_id, step.millivolts, log_sink)?;
            }
            applied.push(mv_to_mailbox_units(step.millivolts));

            step_started = Instant::now();
        }

        Ok(applied)
    }
}
