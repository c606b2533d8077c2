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

use thiserror::Error as ThisError;

use cpu_utils::CPUPinningError;
use cpu_utils::LogicalCoreId;
use rwvolt_msr::MSRError;

/// Errors of a sampling or voltage control run.
///
/// Register access and pinning failures mean the run can't be trusted anymore and are
/// fatal, sink failures happen before or apart from any hardware state change.
#[derive(ThisError, Debug)]
pub enum VoltageError {
    #[error(transparent)]
    MSRError(#[from] MSRError),

    #[error("binding the current thread to logical core {core_id} failed: {error}")]
    PinningFailed {
        core_id: LogicalCoreId,
        error: CPUPinningError,
    },

    #[error("duplicating a sink handle failed: {0}")]
    SinkDuplication(std::io::Error),

    #[error("writing into a sink failed: {0}")]
    SinkWrite(std::io::Error),

    #[error("voltage schedule has {periods} periods but {values} values")]
    ScheduleMismatch { periods: usize, values: usize },
}

impl VoltageError {
    pub fn pinning_failed(core_id: LogicalCoreId, error: CPUPinningError) -> Self {
        Self::PinningFailed { core_id, error }
    }

    pub(crate) fn sink_duplication(error: std::io::Error) -> Self {
        Self::SinkDuplication(error)
    }

    pub(crate) fn sink_write(error: std::io::Error) -> Self {
        Self::SinkWrite(error)
    }

    pub(crate) fn schedule_mismatch(periods: usize, values: usize) -> Self {
        Self::ScheduleMismatch { periods, values }
    }

    /// Fatal errors abort the whole run, the others are reported back to the caller
    /// without any register being touched afterwards.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MSRError(_) | Self::PinningFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tiers() {
        let sink_error = VoltageError::sink_write(std::io::Error::from_raw_os_error(9));
        assert!(!sink_error.is_fatal());

        let duplication_error =
            VoltageError::sink_duplication(std::io::Error::from_raw_os_error(9));
        assert!(!duplication_error.is_fatal());

        let schedule_error = VoltageError::schedule_mismatch(2, 3);
        assert!(!schedule_error.is_fatal());

        let pinning_error = VoltageError::pinning_failed(
            1.into(),
            CPUPinningError::pin_rejected(1.into()),
        );
        assert!(pinning_error.is_fatal());

        let msr_error = VoltageError::from(MSRError::Unsupported);
        assert!(msr_error.is_fatal());
    }
}
