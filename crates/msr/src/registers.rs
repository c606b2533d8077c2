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

//! Well-known register ids and the voltage field layout.

use crate::codec::BitField;

pub type RegisterId = u32;

/// Overclocking mailbox, voltage requests are issued by writing a command into it.
pub const MSR_OC_MAILBOX: RegisterId = 0x150;

/// Performance status, holds the current core voltage.
pub const MSR_IA32_PERF_STATUS: RegisterId = 0x198;

/// Performance control, reserved, nothing writes it yet.
pub const MSR_IA32_PERF_CTL: RegisterId = 0x199;

/// Bits of `MSR_IA32_PERF_STATUS` holding the core voltage in raw units.
pub const PERF_STATUS_VOLTAGE_FIELD: BitField = match BitField::new(47, 32) {
    Ok(field) => field,
    Err(_) => panic!("voltage field should be a valid bit field"),
};

/// Raw voltage units per volt.
pub const VOLTAGE_UNITS_PER_VOLT: f64 = 8192.0;

/// Extracts the raw core voltage from a `MSR_IA32_PERF_STATUS` value.
pub const fn perf_status_voltage(perf_status: u64) -> u64 {
    PERF_STATUS_VOLTAGE_FIELD.extract(perf_status)
}

pub fn raw_voltage_to_volts(raw: u64) -> f64 {
    raw as f64 / VOLTAGE_UNITS_PER_VOLT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_field_matches_perf_status_layout() {
        assert_eq!(PERF_STATUS_VOLTAGE_FIELD.high(), 47);
        assert_eq!(PERF_STATUS_VOLTAGE_FIELD.low(), 32);
        assert_eq!(perf_status_voltage(0x0000_1C00_0000_2A00), 0x1C00);
    }

    #[test]
    fn raw_units_convert_to_volts() {
        assert_eq!(raw_voltage_to_volts(0), 0.0);
        assert_eq!(raw_voltage_to_volts(8192), 1.0);
        assert_eq!(raw_voltage_to_volts(0x1C00), 0.875);
    }
}
