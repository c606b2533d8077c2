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

#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("bit field {high}:{low} is out of a 64-bit register")]
    OutOfRange { high: u32, low: u32 },

    #[error("bit field {high}:{low} has the high bit below the low bit")]
    Inverted { high: u32, low: u32 },
}

/// Inclusive range of bits of a 64-bit register value, 0-indexed from the LSB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitField {
    high: u32,
    low: u32,
}

impl BitField {
    pub const fn new(high: u32, low: u32) -> Result<Self, CodecError> {
        if high > 63 || low > 63 {
            return Err(CodecError::OutOfRange { high, low });
        }
        if high < low {
            return Err(CodecError::Inverted { high, low });
        }

        Ok(Self { high, low })
    }

    pub const fn high(&self) -> u32 {
        self.high
    }

    pub const fn low(&self) -> u32 {
        self.low
    }

    pub const fn width(&self) -> u32 {
        self.high - self.low + 1
    }

    /// Mask of the field already shifted down to bit 0.
    pub const fn mask(&self) -> u64 {
        u64::MAX >> (63 - (self.high - self.low))
    }

    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u64 {
        self.mask()
    }

    pub const fn extract(&self, value: u64) -> u64 {
        (value >> self.low) & self.mask()
    }
}

/// Extracts bits `high..=low` of `value`.
///
/// Panics if `low > high` or `high > 63`, use [`BitField`] to validate a descriptor
/// coming from outside.
pub const fn extract_bits(value: u64, high: u32, low: u32) -> u64 {
    match BitField::new(high, low) {
        Ok(field) => field.extract(value),
        Err(_) => panic!("invalid bit field descriptor"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_full_voltage_field() {
        assert_eq!(extract_bits(0xFFFF_FFFF_FFFF_FFFF, 47, 32), 0xFFFF);
    }

    #[test]
    fn extract_isolated_high_bit() {
        assert_eq!(extract_bits(0x0000_8000_0000_0000, 47, 32), 0x8000);
        assert_eq!(extract_bits(0x0000_8000_0000_0000, 46, 32), 0);
    }

    #[test]
    fn extract_ignores_neighbour_bits() {
        let value = 0xAAAA_1234_5555_5555;
        assert_eq!(extract_bits(value, 47, 32), 0x1234);
        assert_eq!(extract_bits(value, 3, 0), 0x5);
        assert_eq!(extract_bits(value, 63, 60), 0xA);
    }

    #[test]
    fn extract_whole_and_single_bit_ranges() {
        let value = 0x8000_0000_0000_0001;
        assert_eq!(extract_bits(value, 63, 0), value);
        assert_eq!(extract_bits(value, 0, 0), 1);
        assert_eq!(extract_bits(value, 63, 63), 1);
        assert_eq!(extract_bits(value, 62, 62), 0);
    }

    #[test]
    fn extracted_value_fits_field_width() {
        let values = [
            0u64,
            1,
            0x0123_4567_89AB_CDEF,
            0xDEAD_BEEF_CAFE_BABE,
            u64::MAX,
        ];

        for high in 0..64 {
            for low in 0..=high {
                let field = BitField::new(high, low).unwrap();
                for value in values {
                    let extracted = field.extract(value);
                    assert!(extracted <= field.max_value());
                    if field.width() < 64 {
                        assert!(extracted < 1u64 << field.width());
                    }
                    assert_eq!(extracted, extract_bits(value, high, low));
                }
            }
        }
    }

    #[test]
    fn invalid_descriptors_are_rejected() {
        assert_eq!(
            BitField::new(31, 32),
            Err(CodecError::Inverted { high: 31, low: 32 })
        );
        assert_eq!(
            BitField::new(64, 32),
            Err(CodecError::OutOfRange { high: 64, low: 32 })
        );
    }

    #[test]
    #[should_panic]
    fn extract_bits_panics_on_inverted_range() {
        extract_bits(u64::MAX, 3, 4);
    }
}
