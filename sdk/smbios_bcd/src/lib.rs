//! Packed Binary Coded Decimal (BCD) conversions.
//!
//! Firmware tables and the RTC report several version and date fields as
//! packed BCD: one decimal digit per nibble, high nibble first. These helpers
//! convert between that encoding, plain binary values and pairs of ASCII
//! digits.
//!
//! ```
//! use smbios_bcd::{bcd_to_decimal, decimal_to_bcd};
//!
//! assert_eq!(bcd_to_decimal(0x28), Ok(28));
//! assert_eq!(decimal_to_bcd(28), Ok(0x28));
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![cfg_attr(not(test), no_std)]

use core::fmt;

use r_efi::efi;

/// Largest value representable by a single packed BCD byte.
pub const BCD_MAX_DECIMAL: u8 = 99;

/// Errors returned by the BCD conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcdError {
    /// A nibble of the packed value is greater than 9.
    InvalidBcd(u8),
    /// The binary value does not fit in two decimal digits.
    OutOfRange(u8),
    /// The byte is not an ASCII digit (`'0'..='9'`).
    InvalidDigit(u8),
}

impl fmt::Display for BcdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcdError::InvalidBcd(value) => write!(f, "{value:#04x} is not a packed BCD value"),
            BcdError::OutOfRange(value) => write!(f, "{value} does not fit in two BCD digits"),
            BcdError::InvalidDigit(value) => write!(f, "{value:#04x} is not an ASCII digit"),
        }
    }
}

impl From<BcdError> for efi::Status {
    fn from(_value: BcdError) -> Self {
        efi::Status::INVALID_PARAMETER
    }
}

fn split_nibbles(bcd: u8) -> Result<(u8, u8), BcdError> {
    let (high, low) = (bcd >> 4, bcd & 0x0F);
    if high > 9 || low > 9 {
        return Err(BcdError::InvalidBcd(bcd));
    }
    Ok((high, low))
}

/// Converts a packed BCD byte to its binary value, e.g. `0x42` to `42`.
pub fn bcd_to_decimal(bcd: u8) -> Result<u8, BcdError> {
    let (tens, ones) = split_nibbles(bcd)?;
    Ok(tens * 10 + ones)
}

/// Converts a binary value in `0..=99` to packed BCD, e.g. `42` to `0x42`.
pub fn decimal_to_bcd(value: u8) -> Result<u8, BcdError> {
    if value > BCD_MAX_DECIMAL {
        return Err(BcdError::OutOfRange(value));
    }
    Ok(((value / 10) << 4) | (value % 10))
}

/// Unpacks a BCD byte into two ASCII digits, most significant first.
pub fn bcd_to_ascii(bcd: u8) -> Result<[u8; 2], BcdError> {
    let (tens, ones) = split_nibbles(bcd)?;
    Ok([b'0' + tens, b'0' + ones])
}

/// Packs two ASCII digits, most significant first, into one BCD byte.
pub fn ascii_to_bcd(high: u8, low: u8) -> Result<u8, BcdError> {
    for digit in [high, low] {
        if !digit.is_ascii_digit() {
            return Err(BcdError::InvalidDigit(digit));
        }
    }
    Ok(((high - b'0') << 4) | (low - b'0'))
}
