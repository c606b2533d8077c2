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

//! Encoding of the overclocking mailbox voltage commands.
//!
//! The mailbox counts voltage in 1/1024 V, a command is the fixed core voltage tag
//! xor-ed with the masked payload shifted into the sub-command specific position.

/// Voltage in mailbox units, 1/1024 V.
pub type MailboxUnits = i32;

pub const MAILBOX_CORE_VOLTAGE_TAG: u64 = 0x8000_0011_0000_0000;

const OFFSET_PAYLOAD_MASK: u64 = 0x7ff;
const OFFSET_PAYLOAD_SHIFT: u32 = 21;

const SET_PAYLOAD_MASK: u64 = 0xfff;
const SET_PAYLOAD_SHIFT: u32 = 8;

/// Converts millivolts into mailbox units, `mv * 1.024` truncated toward zero and
/// saturated to the [`MailboxUnits`] range.
pub const fn mv_to_mailbox_units(millivolts: i32) -> MailboxUnits {
    // 1.024 = 1024 / 1000, i64 keeps the product exact and `/` truncates toward zero.
    let units = millivolts as i64 * 1024 / 1000;
    if units > MailboxUnits::MAX as i64 {
        MailboxUnits::MAX
    } else if units < MailboxUnits::MIN as i64 {
        MailboxUnits::MIN
    } else {
        units as MailboxUnits
    }
}

/// Command offsetting the core voltage by `units`, payload is an 11-bit two's complement
/// value at bit 21.
pub const fn offset_core_voltage_command(units: MailboxUnits) -> u64 {
    MAILBOX_CORE_VOLTAGE_TAG ^ ((units as u64 & OFFSET_PAYLOAD_MASK) << OFFSET_PAYLOAD_SHIFT)
}

/// Command setting the core voltage to `units`, payload is a 12-bit value at bit 8.
pub const fn set_core_voltage_command(units: MailboxUnits) -> u64 {
    MAILBOX_CORE_VOLTAGE_TAG ^ ((units as u64 & SET_PAYLOAD_MASK) << SET_PAYLOAD_SHIFT)
}
