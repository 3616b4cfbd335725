// Fixed-width literal values
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of HWIR.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Fixed-width bit vectors used as the payload of literal nodes.
//!
//! Widths are limited to [`global::MAX_LITERAL_BIT_COUNT`];
//!   wider literals are the business of the front end and are not needed
//!   by any transformation in the mid-end.

use super::{IrError, IrResult};
use crate::global;
use std::fmt::{self, Display};

/// A bit vector of a fixed width.
///
/// Bits above [`Bits::bit_count`] are always zero,
///   so two [`Bits`] of the same width compare equal exactly when their
///   values are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bits {
    bit_count: u32,
    value: u64,
}

impl Bits {
    /// A zero-valued bit vector of the given width.
    pub fn zero(bit_count: u32) -> IrResult<Self> {
        Self::ubits(0, bit_count)
    }

    /// Every bit of the given width set.
    pub fn all_ones(bit_count: u32) -> IrResult<Self> {
        check_width(bit_count)?;

        Ok(Self {
            bit_count,
            value: mask(bit_count),
        })
    }

    /// Interpret `value` as an unsigned integer of `bit_count` bits.
    ///
    /// Fails if `value` requires more than `bit_count` bits.
    pub fn ubits(value: u64, bit_count: u32) -> IrResult<Self> {
        check_width(bit_count)?;

        if Self::min_bit_count_unsigned(value) > bit_count {
            return Err(IrError::LiteralOverflow {
                value: format!("{value:#x}"),
                bit_count,
            });
        }

        Ok(Self { bit_count, value })
    }

    /// Interpret `value` as a two's complement integer of `bit_count`
    ///   bits.
    ///
    /// Fails if `value` requires more than `bit_count` bits.
    pub fn sbits(value: i64, bit_count: u32) -> IrResult<Self> {
        check_width(bit_count)?;

        if Self::min_bit_count_signed(value) > bit_count {
            return Err(IrError::LiteralOverflow {
                value: format!("{value}"),
                bit_count,
            });
        }

        Ok(Self {
            bit_count,
            value: (value as u64) & mask(bit_count),
        })
    }

    /// Minimum number of bits required to hold `value` unsigned.
    pub fn min_bit_count_unsigned(value: u64) -> u32 {
        u64::BITS - value.leading_zeros()
    }

    /// Minimum number of bits required to hold `value` as two's
    ///   complement.
    pub fn min_bit_count_signed(value: i64) -> u32 {
        match value {
            0 => 0,
            // `-(value + 1)` cannot overflow when `value` is negative.
            v if v < 0 => Self::min_bit_count_unsigned((-(v + 1)) as u64) + 1,
            v => Self::min_bit_count_unsigned(v as u64) + 1,
        }
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// The value zero-extended to 64 bits.
    pub fn to_u64(&self) -> u64 {
        self.value
    }

    /// Value of the bit at `index`,
    ///   or [`None`] if `index` is out of range.
    pub fn get(&self, index: u32) -> Option<bool> {
        (index < self.bit_count).then(|| (self.value >> index) & 1 == 1)
    }

    pub fn pop_count(&self) -> u32 {
        self.value.count_ones()
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Whether the value is exactly one.
    pub fn is_one(&self) -> bool {
        self.value == 1
    }

    pub fn is_all_ones(&self) -> bool {
        self.value == mask(self.bit_count)
    }
}

impl Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "bits[{}]:{}", self.bit_count, self.value)
    }
}

fn check_width(bit_count: u32) -> IrResult<()> {
    if bit_count > global::MAX_LITERAL_BIT_COUNT {
        return Err(IrError::LiteralOverflow {
            value: format!("bits[{bit_count}]"),
            bit_count: global::MAX_LITERAL_BIT_COUNT,
        });
    }

    Ok(())
}

fn mask(bit_count: u32) -> u64 {
    match bit_count {
        0 => 0,
        n if n >= u64::BITS => u64::MAX,
        n => (1u64 << n) - 1,
    }
}
